use std::env;

const FLEET_SERVER_HOST: &str = "localhost";
const FLEET_SERVER_PORT: u16 = 8000;

#[derive(Debug)]
pub struct Config {
    pub url: String,
}

impl Config {
    pub fn from_env() -> Self {
        let address =
            env::var("FLEET_SERVER_HOST").unwrap_or_else(|_| FLEET_SERVER_HOST.to_string());

        let port = env::var("FLEET_SERVER_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(FLEET_SERVER_PORT);

        Self {
            url: format!("http://{}:{}", address, port),
        }
    }
}
