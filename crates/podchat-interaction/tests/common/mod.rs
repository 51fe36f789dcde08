//! An in-memory pod for exercising the history store without a server.
//!
//! It understands the same requests a Community Solid Server answers for the
//! store: HEAD/GET/PUT/PATCH/DELETE on containers and Turtle documents, with
//! SPARQL Update patches applied through the codec. A conditional patch whose
//! WHERE clause does not match exactly once is answered with 409.
#![allow(dead_code)]

pub mod http;

use async_trait::async_trait;
use podchat_core::codec::GraphCodec;
use podchat_core::graph::Graph;
use podchat_core::session::{AuthSession, HttpMethod, PodRequest, PodResponse};
use podchat_core::{PodError, Result};
use podchat_infrastructure::TurtleCodec;
use podchat_interaction::SolidChatHistory;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

pub const POD: &str = "https://pod.example/alice/";
pub const CONTAINER: &str = "https://pod.example/alice/private/";
pub const DOCUMENT: &str = "https://pod.example/alice/private/chatdocs.ttl";

#[derive(Debug, Clone)]
enum Resource {
    Container,
    Document(Graph),
    /// Stored verbatim, for documents the codec cannot read.
    Raw(String),
}

#[derive(Debug, Default)]
struct PodState {
    resources: BTreeMap<String, Resource>,
    requests: Vec<PodRequest>,
    failing: Vec<HttpMethod>,
    overrides: Vec<(HttpMethod, String, u16)>,
}

/// Shared handle to one in-memory pod. Clones see the same resources.
#[derive(Debug, Clone, Default)]
pub struct MemoryPod {
    state: Arc<Mutex<PodState>>,
    offline: Arc<AtomicBool>,
}

impl MemoryPod {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every request fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Requests with `method` fail with a transport error from now on.
    pub fn fail(&self, method: HttpMethod) {
        self.state.lock().unwrap().failing.push(method);
    }

    /// Answers `method` on `url` with `status` and an empty body, leaving
    /// the resources alone.
    pub fn answer(&self, method: HttpMethod, url: &str, status: u16) {
        self.state
            .lock()
            .unwrap()
            .overrides
            .push((method, url.to_string(), status));
    }

    pub fn requests(&self) -> Vec<PodRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn count(&self, method: HttpMethod, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .count()
    }

    pub fn exists(&self, url: &str) -> bool {
        self.state.lock().unwrap().resources.contains_key(url)
    }

    pub fn document(&self, url: &str) -> Option<Graph> {
        match self.state.lock().unwrap().resources.get(url) {
            Some(Resource::Document(graph)) => Some(graph.clone()),
            _ => None,
        }
    }

    /// Stores `turtle` as the document at `url`, as another client would.
    pub fn put_turtle(&self, url: &str, turtle: &str) {
        let resource = match TurtleCodec.parse_document(turtle, url) {
            Ok(graph) => Resource::Document(graph),
            Err(_) => Resource::Raw(turtle.to_string()),
        };
        self.state
            .lock()
            .unwrap()
            .resources
            .insert(url.to_string(), resource);
    }

    /// A history store on [`DOCUMENT`] talking to this pod.
    pub fn history(&self) -> SolidChatHistory<MemoryPod, TurtleCodec> {
        SolidChatHistory::with_session(self.clone(), TurtleCodec, CONTAINER, DOCUMENT)
    }

    fn handle(&self, request: &PodRequest) -> PodResponse {
        let codec = TurtleCodec;
        let mut state = self.state.lock().unwrap();
        let url = request.url.clone();

        match request.method {
            HttpMethod::Head => match state.resources.get(&url) {
                Some(_) => PodResponse::new(200, ""),
                None => PodResponse::new(404, ""),
            },
            HttpMethod::Get => match state.resources.get(&url) {
                Some(Resource::Document(graph)) => {
                    PodResponse::new(200, codec.serialize_document(graph))
                }
                Some(Resource::Raw(text)) => PodResponse::new(200, text.clone()),
                Some(Resource::Container) => PodResponse::new(200, ""),
                None => PodResponse::new(404, "Not Found"),
            },
            HttpMethod::Put => {
                if request.header("If-None-Match") == Some("*") && state.resources.contains_key(&url)
                {
                    return PodResponse::new(412, "Precondition Failed");
                }
                let resource = if url.ends_with('/') {
                    Resource::Container
                } else {
                    Resource::Document(Graph::new())
                };
                state.resources.insert(url, resource);
                PodResponse::new(201, "")
            }
            HttpMethod::Patch => {
                if request.header("Content-Type") != Some(codec.patch_media_type()) {
                    return PodResponse::new(415, "Unsupported Media Type");
                }
                let patch = match codec.parse_patch(request.body.as_deref().unwrap_or(""), &url) {
                    Ok(patch) => patch,
                    Err(e) => return PodResponse::new(400, e.to_string()),
                };
                let mut graph = match state.resources.get(&url) {
                    Some(Resource::Document(graph)) => graph.clone(),
                    Some(_) => return PodResponse::new(409, "Not a patchable document"),
                    None => Graph::new(),
                };
                match patch.apply(&mut graph) {
                    Ok(()) => {
                        state.resources.insert(url, Resource::Document(graph));
                        PodResponse::new(205, "")
                    }
                    Err(PodError::PatchConflict { matches }) => PodResponse::new(
                        409,
                        format!("The document does not contain exactly one match ({matches})"),
                    ),
                    Err(e) => PodResponse::new(400, e.to_string()),
                }
            }
            HttpMethod::Delete => match state.resources.remove(&url) {
                Some(_) => PodResponse::new(205, ""),
                None => PodResponse::new(404, "Not Found"),
            },
        }
    }
}

#[async_trait]
impl AuthSession for MemoryPod {
    async fn send(&self, request: PodRequest) -> Result<PodResponse> {
        let overridden = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(request.clone());
            if self.offline.load(Ordering::SeqCst) || state.failing.contains(&request.method) {
                return Err(PodError::transport("connection refused"));
            }
            state
                .overrides
                .iter()
                .find(|(method, url, _)| *method == request.method && *url == request.url)
                .map(|(_, _, status)| *status)
        };
        match overridden {
            Some(status) => Ok(PodResponse::new(status, "")),
            None => Ok(self.handle(&request)),
        }
    }
}
