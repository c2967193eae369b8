use std::collections::HashMap;
use std::net::IpAddr;
use std::time::Instant;

/// Limits applied to inbound connections and traffic
///
/// The frame size cap lives in the framing layer; this config covers
/// connection counts and message rate.
#[derive(Debug, Clone)]
pub struct DoSConfig {
    /// Maximum total concurrent connections
    pub max_connections_total: usize,
    /// Maximum connections per IP address
    pub max_connections_per_ip: usize,
    /// Steady-state messages per second per connection
    pub messages_per_second: u32,
    /// Bucket capacity, absorbs short bursts above the steady rate
    pub burst: u32,
}

impl Default for DoSConfig {
    fn default() -> Self {
        Self {
            max_connections_total: 64,
            max_connections_per_ip: 5,
            messages_per_second: 60,
            burst: 120,
        }
    }
}

impl DoSConfig {
    pub fn from_server_config(config: &crate::config::ServerConfig) -> Self {
        Self {
            max_connections_total: config.max_connections,
            max_connections_per_ip: config.max_connections_per_ip,
            messages_per_second: config.messages_per_second,
            burst: config.messages_per_second.saturating_mul(2),
        }
    }
}

/// Errors from connection admission checks
#[derive(Debug, Clone, thiserror::Error)]
pub enum DoSError {
    #[error("too many total connections")]
    TooManyConnections,
    #[error("too many connections from this IP")]
    TooManyConnectionsFromIp,
}

/// Per-connection message rate limiter
///
/// Owned by the connection's read loop and checked once per frame, ahead
/// of decode. A connection that drains the bucket is closed, so a client
/// has to sustain more than the refill rate to trip it.
#[derive(Debug)]
pub struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl TokenBucket {
    pub fn new(refill_per_sec: u32, capacity: u32) -> Self {
        Self {
            capacity: capacity as f64,
            tokens: capacity as f64,
            refill_per_sec: refill_per_sec as f64,
            last_refill: Instant::now(),
        }
    }

    /// Take one token, refilling for the elapsed interval first
    pub fn try_consume(&mut self) -> bool {
        self.try_consume_at(Instant::now())
    }

    fn try_consume_at(&mut self, now: Instant) -> bool {
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Accept-time connection bookkeeping shared across connection tasks
pub struct DoSProtection {
    config: DoSConfig,
    /// Connections per IP
    ip_connections: HashMap<IpAddr, usize>,
    /// Total active connections
    total_connections: usize,
}

impl DoSProtection {
    pub fn new(config: DoSConfig) -> Self {
        Self {
            config,
            ip_connections: HashMap::new(),
            total_connections: 0,
        }
    }

    /// Admit a new connection from this IP, counting it on success
    pub fn register_connection(&mut self, ip: IpAddr) -> Result<(), DoSError> {
        if self.total_connections >= self.config.max_connections_total {
            return Err(DoSError::TooManyConnections);
        }

        let ip_count = self.ip_connections.get(&ip).copied().unwrap_or(0);
        if ip_count >= self.config.max_connections_per_ip {
            return Err(DoSError::TooManyConnectionsFromIp);
        }

        *self.ip_connections.entry(ip).or_insert(0) += 1;
        self.total_connections += 1;
        Ok(())
    }

    /// Release a connection's slot
    pub fn unregister_connection(&mut self, ip: IpAddr) {
        if let Some(count) = self.ip_connections.get_mut(&ip) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.ip_connections.remove(&ip);
            }
        }
        self.total_connections = self.total_connections.saturating_sub(1);
    }

    /// Build the rate bucket handed to a connection's read loop
    pub fn message_bucket(&self) -> TokenBucket {
        TokenBucket::new(self.config.messages_per_second, self.config.burst)
    }

    pub fn connection_count(&self) -> usize {
        self.total_connections
    }

    pub fn connections_from_ip(&self, ip: IpAddr) -> usize {
        self.ip_connections.get(&ip).copied().unwrap_or(0)
    }
}

impl Default for DoSProtection {
    fn default() -> Self {
        Self::new(DoSConfig::default())
    }
}
