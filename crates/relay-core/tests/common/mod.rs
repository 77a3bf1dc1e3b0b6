//! Shared helpers for the relay-core integration tests.
//!
//! All test URLs use `127.0.0.1` with an explicit port.

#![allow(dead_code)]

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::header::HeaderMap;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use relay_core::domain::{CallEnvelope, CallId, CallRecord};
use relay_core::impls::InMemoryRecordStore;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// One request as seen by [`TestEndpoint`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub headers: HeaderMap,
    pub body: String,
}

/// Power-on endpoint stand-in: answers every POST with a fixed status and
/// body and remembers what it was sent.
pub struct TestEndpoint {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestEndpoint {
    pub async fn start(status: StatusCode, body: &'static str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/poweron", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    accepted = listener.accept() => {
                        let Ok((stream, _)) = accepted else { continue };
                        let recorded = recorded.clone();
                        tokio::spawn(async move {
                            let service = service_fn(move |req: Request<Incoming>| {
                                let recorded = recorded.clone();
                                async move {
                                    let (parts, incoming) = req.into_parts();
                                    let bytes = incoming.collect().await.unwrap().to_bytes();
                                    recorded.lock().unwrap().push(RecordedRequest {
                                        method: parts.method.to_string(),
                                        headers: parts.headers,
                                        body: String::from_utf8_lossy(&bytes).into_owned(),
                                    });
                                    Ok::<_, Infallible>(
                                        Response::builder()
                                            .status(status)
                                            .body(Full::new(Bytes::from_static(body.as_bytes())))
                                            .unwrap(),
                                    )
                                }
                            });
                            if let Err(err) = http1::Builder::new()
                                .serve_connection(TokioIo::new(stream), service)
                                .await
                            {
                                eprintln!("test endpoint error: {err}");
                            }
                        });
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        Self {
            url,
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for TestEndpoint {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A URL on which nothing listens.
pub async fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/poweron")
}

/// The `Call` column JSON as the upstream producer writes it.
pub fn call_json(call_id: &str, url: &str, callback: &str) -> String {
    json!({
        "symXCallId": call_id,
        "correlationId": format!("corr-{call_id}"),
        "callbackQueue": callback,
        "symXInstanceUrl": url,
        "symXPowerOn": "RDC.DEPOSIT",
        "symXEnvelope": {
            "body": {
                "executePowerOnReturnArray": {
                    "request": {
                        "branchId": 3,
                        "credentials": {
                            "processorUser": "1999",
                            "administrativeCredentials": { "password": "secret" }
                        },
                        "deviceInformation": { "deviceType": "RDC", "deviceNumber": 20 },
                        "header": { "messageID": "msg-1" },
                        "body": {
                            "file": "RDC.DEPOSIT",
                            "rgSession": 1,
                            "userDefinedParameters": {
                                "rgUserChr": [{ "id": 1, "value": "0001234" }],
                                "rgUserNum": [{ "id": 1, "value": 2500 }]
                            },
                            "user": "relay"
                        }
                    }
                }
            }
        }
    })
    .to_string()
}

pub fn envelope(call_id: &str, url: &str, callback: &str) -> CallEnvelope {
    serde_json::from_str(&call_json(call_id, url, callback)).unwrap()
}

pub async fn seed(store: &InMemoryRecordStore, call_id: &str, url: &str, callback: &str) {
    store
        .insert(CallRecord::pending(
            CallId::from(call_id),
            call_json(call_id, url, callback),
        ))
        .await;
}
