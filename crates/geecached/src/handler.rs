//! Command handler for the peer protocol

use std::sync::Arc;

use bytes::Bytes;
use geecache::{Error, Registry};

use crate::frame::Frame;

/// Answers peer and client commands from the groups in a registry
pub struct CommandHandler {
    registry: Arc<Registry>,
}

impl CommandHandler {
    /// Create a handler serving every group in `registry`
    pub fn new(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    /// Execute one command frame; may block on peer or source I/O
    pub fn handle(&self, cmd: Frame) -> Frame {
        let args = match cmd {
            Frame::Array(args) if !args.is_empty() => args,
            _ => return Frame::Error("ERR invalid command format".to_string()),
        };

        let command = match &args[0] {
            Frame::Bulk(name) => String::from_utf8_lossy(name).to_uppercase(),
            _ => return Frame::Error("ERR invalid command".to_string()),
        };

        match command.as_str() {
            "PING" => Frame::Simple("PONG".to_string()),
            "GET" => self.handle_get(&args[1..]),
            "STATS" => self.handle_stats(&args[1..]),
            // redis-cli and client libraries send these on connect
            "COMMAND" => Frame::Array(vec![]),
            "CLIENT" => Frame::Simple("OK".to_string()),
            _ => Frame::Error(format!("ERR unknown command '{}'", command)),
        }
    }

    fn handle_get(&self, args: &[Frame]) -> Frame {
        let [group, key] = args else {
            return Frame::Error("ERR wrong number of arguments for 'get' command".to_string());
        };
        let (Some(group), Some(key)) = (text(group), text(key)) else {
            return Frame::Error("ERR group and key must be UTF-8 strings".to_string());
        };

        let Some(group) = self.registry.get_group(&group) else {
            return Frame::Error(format!("ERR {}", Error::GroupNotFound(group)));
        };

        match group.get(&key) {
            Ok(view) => Frame::Bulk(Bytes::from(view.byte_slice())),
            Err(e) => Frame::Error(format!("ERR {}", e)),
        }
    }

    fn handle_stats(&self, args: &[Frame]) -> Frame {
        let Some(name) = args.first().and_then(text) else {
            return Frame::Error("ERR wrong number of arguments for 'stats' command".to_string());
        };
        let Some(group) = self.registry.get_group(&name) else {
            return Frame::Error(format!("ERR {}", Error::GroupNotFound(name)));
        };

        let stats = group.stats();
        let info = format!(
            "# Group\r\n\
             name:{}\r\n\
             cache_entries:{}\r\n\
             cache_bytes:{}\r\n\
             \r\n\
             # Stats\r\n\
             gets:{}\r\n\
             cache_hits:{}\r\n\
             peer_loads:{}\r\n\
             peer_errors:{}\r\n\
             local_loads:{}\r\n\
             local_load_errs:{}\r\n\
             evictions:{}\r\n\
             hit_ratio:{:.2}\r\n",
            group.name(),
            group.cache_len(),
            group.cache_bytes(),
            stats.gets(),
            stats.cache_hits(),
            stats.peer_loads(),
            stats.peer_errors(),
            stats.local_loads(),
            stats.local_load_errs(),
            stats.evictions(),
            stats.hit_ratio(),
        );
        Frame::Bulk(Bytes::from(info))
    }
}

fn text(frame: &Frame) -> Option<String> {
    match frame {
        Frame::Bulk(data) => String::from_utf8(data.to_vec()).ok(),
        _ => None,
    }
}
