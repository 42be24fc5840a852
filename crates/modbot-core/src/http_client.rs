use reqwest::Client;
use std::time::Duration;

use crate::error::Result;

const DISABLE_SYSTEM_PROXY_ENV: &str = "MODBOT_DISABLE_SYSTEM_PROXY";
const USER_AGENT: &str = concat!("modbot/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_http_client(timeout: Duration) -> Result<Client> {
    let mut builder = Client::builder().timeout(timeout).user_agent(USER_AGENT);
    if should_disable_system_proxy() {
        builder = builder.no_proxy();
    }
    Ok(builder.build()?)
}

fn should_disable_system_proxy() -> bool {
    if std::env::var_os(DISABLE_SYSTEM_PROXY_ENV).is_some() {
        return true;
    }

    cfg!(test)
}
