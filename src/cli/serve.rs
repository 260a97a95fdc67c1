use crate::{config::ServerSettings, error, server, warning};

pub async fn serve(addr: Option<String>) {
    let mut settings = match ServerSettings::from_env() {
        Ok(s) => s,
        Err(e) => error!("Cannot start server: {}", e),
    };
    if let Some(addr) = addr {
        settings.addr = addr;
    }

    if !settings.static_dir.is_dir() {
        warning!(
            "Static directory {} not found, only the API will be served",
            settings.static_dir.display()
        );
    }

    if let Err(e) = server::start_web_server(settings).await {
        error!("Server stopped: {}", e);
    }
}
