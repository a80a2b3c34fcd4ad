use lazy_static::lazy_static;
use reqwest::blocking::Client;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// A thread-safe pool of HTTP clients for reuse
///
/// This pool maintains a set of clients for different endpoints,
/// allowing them to be reused instead of creating new connections for each request.
pub struct RpcConnectionPool {
    clients: Mutex<VecDeque<(String, Client)>>,
    max_clients_per_endpoint: usize,
    timeout: Duration,
}

impl RpcConnectionPool {
    /// Create a new connection pool with the specified maximum clients per endpoint and timeout
    pub fn new(max_clients_per_endpoint: usize, timeout: Duration) -> Self {
        Self { clients: Mutex::new(VecDeque::new()), max_clients_per_endpoint, timeout }
    }

    /// Get a client for the specified endpoint
    ///
    /// If a client for this endpoint is available in the pool, it will be returned.
    /// Otherwise, a new client will be created.
    pub fn get_client(&self, endpoint: &str) -> Client {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(index) = clients.iter().position(|(url, _)| url == endpoint) {
            if let Some((_, client)) = clients.remove(index) {
                return client;
            }
        }
        drop(clients);

        log::debug!("Opening new HTTP client for {}", endpoint);
        Client::builder().timeout(self.timeout).build().unwrap_or_else(|e| {
            log::warn!("Falling back to default HTTP client for {}: {}", endpoint, e);
            Client::new()
        })
    }

    /// Return a client to the pool for future reuse
    ///
    /// The client will only be kept if we're under the maximum limit for this endpoint.
    pub fn return_client(&self, endpoint: &str, client: Client) {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        let count = clients.iter().filter(|(url, _)| url == endpoint).count();

        if count < self.max_clients_per_endpoint {
            clients.push_back((endpoint.to_string(), client));
        }
        // Otherwise let it drop
    }

    pub fn pooled_count(&self, endpoint: &str) -> usize {
        let clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        clients.iter().filter(|(url, _)| url == endpoint).count()
    }
}

// Global singleton instance
lazy_static! {
    pub static ref CONNECTION_POOL: RpcConnectionPool = RpcConnectionPool::new(
        5, // 5 clients per endpoint
        Duration::from_secs(30), // covers the node's wait-for-block long poll
    );
}

/// Helper function to get a client and automatically return it when done
///
/// This function handles getting a client from the pool, executing the provided
/// function with it, and then returning the client to the pool.
pub fn with_rpc_client<F, R>(endpoint: &str, f: F) -> R
where
    F: FnOnce(&Client) -> R,
{
    let client = CONNECTION_POOL.get_client(endpoint);
    let result = f(&client);
    CONNECTION_POOL.return_client(endpoint, client);
    result
}
