pub mod api;

use log::info;
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::session::ChatSession;

pub struct Server {
    addr: SocketAddr,
    session: Arc<ChatSession>,
}

impl Server {
    pub fn new(addr: SocketAddr, session: Arc<ChatSession>) -> Self {
        Self { addr, session }
    }

    pub async fn run(&self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let history = self.session.load_history().await?;
        info!("Session ready with {} messages", history.len());
        api::start_http_server(self.addr, Arc::clone(&self.session)).await
    }
}
