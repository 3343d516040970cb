// HTTP Request Layer
//
// Plain-text endpoints over the kernel's boundary operations. Requests are
// served one at a time, so the store has a single writer.

use std::io::Read;

use anyhow::{anyhow, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tiny_http::{Header, Response, Server};

use rounds_kernel::orchestrate::{self, FlowOutcome, Orchestrator, ReorderStatus};
use rounds_kernel::route::{Geocoder, RouteOptimizer};
use rounds_kernel::{BackendError, StoreBackend, TableStore};

/// Largest request body accepted, in bytes.
const MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Debug, Deserialize)]
struct TableRequest {
    table: String,
}

#[derive(Debug, Deserialize)]
struct ValueRequest {
    table: String,
    address: (String, String),
}

#[derive(Debug, Deserialize)]
struct OptimiseRequest {
    addresses: Vec<AddressQuery>,
}

#[derive(Debug, Deserialize)]
struct AddressQuery {
    q: String,
}

/// Status and body of an HTTP reply.
#[derive(Debug, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub json: bool,
}

impl Reply {
    fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            json: false,
        }
    }
}

pub fn run<B, G, O>(addr: &str, store: &mut TableStore<B>, flow: &Orchestrator<G, O>) -> Result<()>
where
    B: StoreBackend,
    G: Geocoder,
    O: RouteOptimizer,
{
    let server = Server::http(addr).map_err(|e| anyhow!("bind http at {}: {}", addr, e))?;
    log::info!("rounds listening on {addr}");

    loop {
        let mut rq = match server.recv() {
            Ok(rq) => rq,
            Err(e) => {
                log::error!("http recv error: {e}");
                continue;
            }
        };

        let body = read_body(rq.as_reader());
        let reply = match body {
            Ok(body) => dispatch(store, flow, rq.method().as_str(), rq.url(), &body),
            Err(reply) => reply,
        };

        log::debug!("{} {} -> {}", rq.method(), rq.url(), reply.status);

        let content_type: &[u8] = if reply.json {
            b"application/json"
        } else {
            b"text/plain; charset=utf-8"
        };
        let mut resp = Response::from_string(reply.body).with_status_code(reply.status);
        if let Ok(ct) = Header::from_bytes(&b"Content-Type"[..], content_type) {
            resp.add_header(ct);
        }
        if let Err(e) = rq.respond(resp) {
            log::warn!("failed to send response: {e}");
        }
    }
}

/// Read at most `MAX_BODY_BYTES` of a request body.
fn read_body<R: Read>(reader: R) -> Result<String, Reply> {
    let mut body = String::new();
    reader
        .take(MAX_BODY_BYTES + 1)
        .read_to_string(&mut body)
        .map_err(|e| Reply::text(400, format!("unreadable request body: {e}")))?;

    if body.len() as u64 > MAX_BODY_BYTES {
        return Err(Reply::text(
            413,
            format!("request body exceeds {MAX_BODY_BYTES} bytes"),
        ));
    }
    Ok(body)
}

/// Route one request to the kernel.
pub fn dispatch<B, G, O>(
    store: &mut TableStore<B>,
    flow: &Orchestrator<G, O>,
    method: &str,
    url: &str,
    body: &str,
) -> Reply
where
    B: StoreBackend,
    G: Geocoder,
    O: RouteOptimizer,
{
    if method != "POST" {
        return Reply::text(405, "method not allowed");
    }

    let result = match url {
        "/create_table" => parse::<TableRequest>(body)
            .map(|r| response_reply(orchestrate::create_table(store, &r.table))),
        "/delete_table" => parse::<TableRequest>(body)
            .map(|r| response_reply(orchestrate::delete_table(store, &r.table))),
        "/rollback" => parse::<TableRequest>(body)
            .map(|r| response_reply(orchestrate::rollback_table(store, &r.table))),
        "/insert_value" => parse::<ValueRequest>(body).map(|r| {
            let (street, postcode) = &r.address;
            flow_reply(flow.insert_value(store, &r.table, street, postcode))
        }),
        "/delete_value" => parse::<ValueRequest>(body).map(|r| {
            let (street, postcode) = &r.address;
            flow_reply(flow.delete_value(store, &r.table, street, postcode))
        }),
        "/optimise" => parse::<OptimiseRequest>(body).map(|r| {
            let queries: Vec<String> = r.addresses.into_iter().map(|a| a.q).collect();
            optimise_reply(flow, &queries)
        }),
        _ => return Reply::text(404, "not found"),
    };

    result.unwrap_or_else(|reply| reply)
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, Reply> {
    serde_json::from_str(body).map_err(|e| Reply::text(400, format!("invalid request body: {e}")))
}

fn storage_failure(e: BackendError) -> Reply {
    log::error!("storage failure: {e}");
    Reply::text(500, format!("storage failure: {e}"))
}

fn response_reply(result: Result<rounds_kernel::Response, BackendError>) -> Reply {
    match result {
        Ok(response) => Reply::text(200, response.message),
        Err(e) => storage_failure(e),
    }
}

fn flow_reply(result: Result<FlowOutcome, BackendError>) -> Reply {
    match result {
        Ok(FlowOutcome {
            mutation,
            reorder: ReorderStatus::Failed(e),
        }) => Reply::text(502, format!("{}\nReorder failed: {e}", mutation.message)),
        Ok(outcome) => Reply::text(200, outcome.mutation.message),
        Err(e) => storage_failure(e),
    }
}

fn optimise_reply<G: Geocoder, O: RouteOptimizer>(flow: &Orchestrator<G, O>, queries: &[String]) -> Reply {
    let locations = match flow.optimise_addresses(queries) {
        Ok(locations) => locations,
        Err(e) => return Reply::text(502, e.to_string()),
    };

    match serde_json::to_string(&locations) {
        Ok(body) => Reply {
            status: 200,
            body,
            json: true,
        },
        Err(e) => Reply::text(500, e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rounds_kernel::route::{CollaboratorError, Coordinate, OptimisedLocation};
    use rounds_kernel::{InMemoryBackend, Record};

    struct Origin;

    impl Geocoder for Origin {
        fn geocode(&self, query: &str) -> Result<Coordinate, CollaboratorError> {
            if query.starts_with("Nowhere") {
                return Err(CollaboratorError::NoMatch(query.to_string()));
            }
            Ok(Coordinate { lat: 0.0, lon: 0.0 })
        }
    }

    /// Moves the last stop to the front.
    struct LastFirst;

    impl RouteOptimizer for LastFirst {
        fn optimise(&self, stops: &[Coordinate]) -> Result<Vec<OptimisedLocation>, CollaboratorError> {
            let n = stops.len();
            Ok(std::iter::once(n - 1)
                .chain(0..n - 1)
                .map(|original_index| OptimisedLocation {
                    lat: 0.0,
                    lon: 0.0,
                    original_index,
                })
                .collect())
        }
    }

    fn setup() -> (TableStore<InMemoryBackend>, Orchestrator<Origin, LastFirst>) {
        let mut store = TableStore::in_memory();
        let flow = Orchestrator::new(Origin, LastFirst);
        dispatch(&mut store, &flow, "POST", "/create_table", r#"{"table":"dummy"}"#);
        dispatch(
            &mut store,
            &flow,
            "POST",
            "/insert_value",
            r#"{"table":"dummy","address":["2 House St","A01"]}"#,
        );
        (store, flow)
    }

    #[test]
    fn insert_value_replies_with_message_and_reorders() {
        let (mut store, flow) = setup();

        let reply = dispatch(
            &mut store,
            &flow,
            "POST",
            "/insert_value",
            r#"{"table":"dummy","address":["1 House St","A01"]}"#,
        );

        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, "Inserted values (1 House St, A01) into dummy");
        assert_eq!(
            store.list_all("dummy").unwrap(),
            &[Record::new("1 House St", "A01"), Record::new("2 House St", "A01")]
        );
    }

    #[test]
    fn forbidden_character_message() {
        let (mut store, flow) = setup();

        let reply = dispatch(
            &mut store,
            &flow,
            "POST",
            "/delete_value",
            r#"{"table":"dummy","address":["1 House St","'A01"]}"#,
        );

        assert_eq!(reply.status, 200);
        assert_eq!(reply.body, "Forbidden character ' in input");
    }

    #[test]
    fn reorder_failure_is_distinguishable() {
        let (mut store, flow) = setup();

        let reply = dispatch(
            &mut store,
            &flow,
            "POST",
            "/insert_value",
            r#"{"table":"dummy","address":["Nowhere Rd","Z99"]}"#,
        );

        assert_eq!(reply.status, 502);
        assert!(reply
            .body
            .starts_with("Inserted values (Nowhere Rd, Z99) into dummy\nReorder failed:"));
        assert_eq!(store.list_all("dummy").unwrap().len(), 2);
    }

    #[test]
    fn table_endpoints() {
        let (mut store, flow) = setup();

        let reply = dispatch(&mut store, &flow, "POST", "/create_table", r#"{"table":"tester_rb"}"#);
        assert_eq!(reply.body, "Cannot have _rb in table name");

        let reply = dispatch(&mut store, &flow, "POST", "/rollback", r#"{"table":"dummy"}"#);
        assert_eq!(reply.body, "Table dummy has been rolled back");
        assert!(store.list_all("dummy").unwrap().is_empty());

        let reply = dispatch(&mut store, &flow, "POST", "/delete_table", r#"{"table":"dummy"}"#);
        assert_eq!(reply.body, "Table dummy and its rollback deleted");

        let reply = dispatch(&mut store, &flow, "POST", "/delete_table", r#"{"table":"blank"}"#);
        assert_eq!(reply.body, "Table blank does not exist");
    }

    #[test]
    fn optimise_returns_locations_json() {
        let (mut store, flow) = setup();

        let reply = dispatch(
            &mut store,
            &flow,
            "POST",
            "/optimise",
            r#"{"addresses":[{"q":"a","format":"json"},{"q":"b","format":"json"}]}"#,
        );

        assert_eq!(reply.status, 200);
        assert!(reply.json);
        let locations: Vec<OptimisedLocation> = serde_json::from_str(&reply.body).unwrap();
        let order: Vec<_> = locations.iter().map(|l| l.original_index).collect();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn malformed_and_unknown_requests() {
        let (mut store, flow) = setup();

        assert_eq!(dispatch(&mut store, &flow, "POST", "/create_table", "{").status, 400);
        assert_eq!(dispatch(&mut store, &flow, "POST", "/nope", "{}").status, 404);
        assert_eq!(dispatch(&mut store, &flow, "GET", "/create_table", "").status, 405);
    }

    #[test]
    fn oversized_body_is_refused() {
        let at_limit = vec![b' '; MAX_BODY_BYTES as usize];
        assert_eq!(read_body(&at_limit[..]).unwrap().len(), at_limit.len());

        let over = vec![b' '; MAX_BODY_BYTES as usize + 1];
        assert_eq!(read_body(&over[..]).unwrap_err().status, 413);

        assert_eq!(read_body(&b"\xff\xfe"[..]).unwrap_err().status, 400);
    }
}
