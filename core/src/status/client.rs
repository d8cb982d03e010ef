//! HTTP status client for the supervisor's `/services` gateway.
//!
//! Probing is two-phase: a bare TCP connect first, so an absent supervisor
//! costs one refused connection instead of an HTTP timeout, then the GET.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use super::record::{parse_listing, ServiceRecord};
use super::{Probe, StatusSource};
use crate::types::ServiceIdent;

pub struct HttpStatusClient {
    connect_timeout: Duration,
    agent: ureq::Agent,
}

impl HttpStatusClient {
    pub fn new() -> Self {
        Self::with_timeouts(Duration::from_secs(2), Duration::from_secs(10))
    }

    /// `connect` bounds the reachability check; `request` bounds the GET.
    pub fn with_timeouts(connect: Duration, request: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(connect)
            .timeout(request)
            .build();
        HttpStatusClient {
            connect_timeout: connect,
            agent,
        }
    }

    fn reachable(&self, http_addr: &str) -> Result<(), String> {
        let addrs = http_addr
            .to_socket_addrs()
            .map_err(|e| format!("cannot resolve {}: {}", http_addr, e))?;
        let mut last_err = format!("{} resolved to no addresses", http_addr);
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(_) => return Ok(()),
                Err(e) => last_err = format!("cannot connect to {}: {}", addr, e),
            }
        }
        Err(last_err)
    }

    fn fetch(&self, http_addr: &str) -> Result<Vec<ServiceRecord>, String> {
        let url = format!("http://{}/services", http_addr);
        let body = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| format!("GET {} failed: {}", url, e))?
            .into_string()
            .map_err(|e| format!("cannot read {}: {}", url, e))?;
        parse_listing(&body).map_err(|e| format!("cannot parse {}: {}", url, e))
    }
}

impl Default for HttpStatusClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusSource for HttpStatusClient {
    fn probe(&self, http_addr: &str, service: &ServiceIdent) -> Probe {
        if let Err(e) = self.reachable(http_addr) {
            debug!(service = %service, "supervisor unreachable, treating as not loaded: {}", e);
            return Probe::Unknown;
        }
        let records = match self.fetch(http_addr) {
            Ok(records) => records,
            Err(e) => {
                debug!(service = %service, "status listing unavailable: {}", e);
                return Probe::Unknown;
            }
        };
        let key = service.short();
        match records
            .into_iter()
            .find(|r| r.origin_name().as_deref() == Some(key.as_str()))
        {
            Some(record) => Probe::Record(record),
            None => {
                debug!(service = %service, "not found on the supervisor at {}", http_addr);
                Probe::Unknown
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve `connections` connections with a canned response. Connections
    /// that close without sending anything (the reachability check) are
    /// skipped. Returns the address and a handle yielding the last request.
    fn serve(status_line: &'static str, body: &str, connections: usize) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let body = body.to_string();
        let handle = thread::spawn(move || {
            let mut last_request = String::new();
            for stream in listener.incoming().take(connections) {
                let mut stream = stream.unwrap();
                let mut buf = [0u8; 4096];
                let n = stream.read(&mut buf).unwrap_or(0);
                if n == 0 {
                    continue;
                }
                last_request = String::from_utf8_lossy(&buf[..n]).to_string();
                let resp = format!(
                    "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(resp.as_bytes());
            }
            last_request
        });
        (addr, handle)
    }

    fn client() -> HttpStatusClient {
        HttpStatusClient::with_timeouts(Duration::from_secs(2), Duration::from_secs(5))
    }

    fn ident(s: &str) -> ServiceIdent {
        ServiceIdent::parse(s).unwrap()
    }

    const LISTING: &str = r#"[
        {"pkg": {"origin": "core", "name": "nginx"}, "process": {"state": "up"}},
        {"pkg": {"origin": "core", "name": "redis", "shutdown_timeout": 12},
         "process": {"state": "down"}, "topology": "leader"}
    ]"#;

    #[test]
    fn finds_record_by_origin_and_name() {
        let (addr, server) = serve("200 OK", LISTING, 2);
        let probe = client().probe(&addr, &ident("core/redis/4.0.14/20190319155852"));
        let request = server.join().unwrap();
        assert!(request.starts_with("GET /services "), "request was {:?}", request);
        match probe {
            Probe::Record(r) => {
                assert_eq!(r.origin_name().as_deref(), Some("core/redis"));
                assert_eq!(r.topology.as_deref(), Some("leader"));
            }
            Probe::Unknown => panic!("expected a record"),
        }
    }

    #[test]
    fn missing_service_is_unknown() {
        let (addr, server) = serve("200 OK", LISTING, 2);
        let probe = client().probe(&addr, &ident("core/postgresql"));
        server.join().unwrap();
        assert!(probe.is_unknown());
    }

    #[test]
    fn http_error_is_unknown() {
        let (addr, server) = serve("500 Internal Server Error", "oops", 2);
        let probe = client().probe(&addr, &ident("core/redis"));
        server.join().unwrap();
        assert!(probe.is_unknown());
    }

    #[test]
    fn unparseable_listing_is_unknown() {
        let (addr, server) = serve("200 OK", "{\"services\": 3}", 2);
        let probe = client().probe(&addr, &ident("core/redis"));
        server.join().unwrap();
        assert!(probe.is_unknown());
    }

    #[test]
    fn refused_connection_is_unknown() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        assert!(client().probe(&addr, &ident("core/redis")).is_unknown());
    }

    #[test]
    fn unresolvable_address_is_unknown() {
        assert!(client()
            .probe("not a host:port", &ident("core/redis"))
            .is_unknown());
    }
}
