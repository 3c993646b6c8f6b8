//! Blocking RESP client used to fetch values from peers

use std::time::Duration;

use anyhow::{bail, Context, Result};
use geecache::{PeerGetter, Request, Response};
use redis::{Client, Connection};

/// Connection to one peer daemon
///
/// Each request opens its own connection; connect, read and write are each
/// bounded by `timeout`.
pub struct RespPeer {
    addr: String,
    timeout: Duration,
}

impl RespPeer {
    /// Create a client for the daemon listening on `addr` (`host:port`)
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    /// Check that the peer answers `PING`
    pub fn ping(&self) -> Result<()> {
        let mut con = self.connect()?;
        let reply: String = redis::cmd("PING").query(&mut con)?;
        if reply != "PONG" {
            bail!("unexpected PING reply {:?}", reply);
        }
        Ok(())
    }

    fn connect(&self) -> redis::RedisResult<Connection> {
        let client = Client::open(format!("redis://{}/", self.addr))?;
        let con = client.get_connection_with_timeout(self.timeout)?;
        con.set_read_timeout(Some(self.timeout))?;
        con.set_write_timeout(Some(self.timeout))?;
        Ok(con)
    }

    fn fetch(&self, req: &Request) -> Result<Response> {
        let mut con = self
            .connect()
            .with_context(|| format!("connecting to {}", self.addr))?;
        let value: Vec<u8> = redis::cmd("GET")
            .arg(&req.group)
            .arg(&req.key)
            .query(&mut con)?;
        Ok(Response { value })
    }
}

impl PeerGetter for RespPeer {
    fn get(&self, req: &Request) -> geecache::Result<Response> {
        self.fetch(req)
            .map_err(|e| geecache::Error::Peer(format!("{}: {:#}", self.addr, e)))
    }
}
