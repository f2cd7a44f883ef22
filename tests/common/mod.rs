//! Common test utilities - RolldTest harness for end-to-end testing

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use reqwest::Client;
use rolld::{Config, Server};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

/// Test harness that spawns a real rolld server on a random port
pub struct RolldTest {
    pub addr: SocketAddr,
    pub client: Client,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
}

impl RolldTest {
    /// Start a new test server instance with OS-seeded dice
    pub async fn start() -> Result<Self> {
        Self::start_with(Config::default()).await
    }

    /// Start a server with the given config; the bind address is replaced
    pub async fn start_with(mut config: Config) -> Result<Self> {
        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        config.bind_addr = addr;

        let server = Arc::new(Server::new(config));
        let server_clone = server.clone();

        // Spawn the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        // Wait for server to be ready
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        // Poll until server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 2 seconds");
        }

        Ok(Self {
            addr,
            client,
            server,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// POST a raw body to /roll and return status plus decoded JSON
    pub async fn roll_raw(&self, body: &str) -> Result<(u16, Value)> {
        let resp = self
            .client
            .post(format!("{}/roll", self.base_url()))
            .body(body.to_string())
            .send()
            .await?;
        let status = resp.status().as_u16();
        Ok((status, resp.json().await?))
    }

    /// POST a JSON batch to /roll
    pub async fn roll(&self, batch: &Value) -> Result<(u16, Value)> {
        self.roll_raw(&batch.to_string()).await
    }

    /// Open a WebSocket connection
    pub async fn connect_ws(&self) -> Result<WsClient> {
        let (stream, _) = connect_async(format!("ws://{}/ws", self.addr)).await?;
        Ok(WsClient { stream })
    }
}

impl Drop for RolldTest {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}

/// WebSocket client speaking one request, one reply
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl WsClient {
    /// Send a text frame and wait for the reply
    pub async fn request(&mut self, text: &str) -> Result<Value> {
        self.stream.send(Message::Text(text.to_string().into())).await?;
        self.recv_json().await
    }

    /// Send a binary frame and wait for the reply
    pub async fn request_binary(&mut self, bytes: &[u8]) -> Result<Value> {
        self.stream.send(Message::Binary(bytes.to_vec().into())).await?;
        self.recv_json().await
    }

    /// Receive the next text frame as JSON
    pub async fn recv_json(&mut self) -> Result<Value> {
        match tokio::time::timeout(Duration::from_secs(5), self.next_json()).await {
            Ok(result) => result,
            Err(_) => anyhow::bail!("Timeout waiting for WebSocket message"),
        }
    }

    async fn next_json(&mut self) -> Result<Value> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(text.as_str())?),
                Some(Ok(Message::Close(_))) | None => anyhow::bail!("WebSocket closed"),
                Some(Err(e)) => return Err(e.into()),
                _ => continue, // Skip binary/ping/pong frames
            }
        }
    }

    /// Close the connection
    pub async fn close(&mut self) -> Result<()> {
        self.stream.close(None).await?;
        Ok(())
    }
}
