//! A minimal gist API served over plain HTTP on localhost.
//!
//! Supports `GET`/`PATCH /gists/{id}`, `POST /gists` and `GET /raw/{file}`
//! for truncated files. One request per connection (`Connection: close`).
//! Versions are issued as `v1`, `v2`, ... newest first.

use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use serde_json::{json, Value};

/// A request the server received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Debug, Default)]
struct GistState {
    id: String,
    exists: bool,
    public: bool,
    files: BTreeMap<String, String>,
    history: Vec<String>,
    truncate: bool,
    fail_next: Option<u16>,
    requests: Vec<RecordedRequest>,
}

impl GistState {
    fn commit(&mut self) -> String {
        let version = format!("v{}", self.history.len() + 1);
        self.history.insert(0, version.clone());
        version
    }

    fn body(&self, base: &str) -> Value {
        let files: serde_json::Map<String, Value> = self
            .files
            .iter()
            .map(|(name, content)| {
                let file = if self.truncate {
                    json!({
                        "filename": name,
                        "content": content.chars().take(4).collect::<String>(),
                        "truncated": true,
                        "raw_url": format!("{base}/raw/{name}"),
                    })
                } else {
                    json!({
                        "filename": name,
                        "content": content,
                        "truncated": false,
                        "raw_url": format!("{base}/raw/{name}"),
                    })
                };
                (name.clone(), file)
            })
            .collect();
        let history: Vec<Value> = self
            .history
            .iter()
            .map(|v| json!({ "version": v, "committed_at": "2024-01-01T00:00:00Z" }))
            .collect();
        json!({
            "id": self.id,
            "public": self.public,
            "files": files,
            "history": history,
        })
    }
}

fn lock(state: &Mutex<GistState>) -> MutexGuard<'_, GistState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to a running mock server. Stops on drop.
pub struct MockGist {
    addr: SocketAddr,
    state: Arc<Mutex<GistState>>,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl MockGist {
    /// Start a server with no gist; `POST /gists` creates one with `id`.
    pub fn start(id: &str) -> io::Result<Self> {
        let state = GistState {
            id: id.to_string(),
            ..GistState::default()
        };
        Self::spawn(state)
    }

    /// Start a server holding a gist with both files at `v1`.
    pub fn with_files(id: &str, files: &[(&str, &str)]) -> io::Result<Self> {
        let mut state = GistState {
            id: id.to_string(),
            exists: true,
            files: files
                .iter()
                .map(|(n, c)| (n.to_string(), c.to_string()))
                .collect(),
            ..GistState::default()
        };
        state.commit();
        Self::spawn(state)
    }

    fn spawn(state: GistState) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let state = Arc::new(Mutex::new(state));
        let shutdown = Arc::new(AtomicBool::new(false));

        let handle = {
            let state = Arc::clone(&state);
            let shutdown = Arc::clone(&shutdown);
            let base = format!("http://{addr}");
            thread::spawn(move || {
                for stream in listener.incoming() {
                    if shutdown.load(Ordering::SeqCst) {
                        break;
                    }
                    if let Ok(stream) = stream {
                        let _ = serve(stream, &state, &base);
                    }
                }
            })
        };

        Ok(Self {
            addr,
            state,
            shutdown,
            handle: Some(handle),
        })
    }

    /// Base URL to use as the API endpoint.
    pub fn api_base(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Replace files as another client would, returning the new version.
    pub fn set_files(&self, files: &[(&str, &str)]) -> String {
        let mut state = lock(&self.state);
        for (name, content) in files {
            state.files.insert(name.to_string(), content.to_string());
        }
        state.exists = true;
        state.commit()
    }

    pub fn file(&self, name: &str) -> Option<String> {
        lock(&self.state).files.get(name).cloned()
    }

    /// Current version, empty if none.
    pub fn version(&self) -> String {
        lock(&self.state).history.first().cloned().unwrap_or_default()
    }

    pub fn is_public(&self) -> bool {
        lock(&self.state).public
    }

    /// Report every file as truncated so clients must use `raw_url`.
    pub fn truncate_files(&self, truncate: bool) {
        lock(&self.state).truncate = truncate;
    }

    /// Answer the next API request with `status`.
    pub fn fail_next(&self, status: u16) {
        lock(&self.state).fail_next = Some(status);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// Number of requests with the given method.
    pub fn count(&self, method: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|r| r.method == method)
            .count()
    }
}

impl Drop for MockGist {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        // Wake the accept loop.
        let _ = TcpStream::connect(self.addr);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(stream: TcpStream, state: &Mutex<GistState>, base: &str) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();
    reader.read_line(&mut line)?;
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 || header == "\r\n" || header == "\n" {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.parse().unwrap_or(0),
                "authorization" => authorization = Some(value.to_string()),
                _ => {}
            }
        }
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;
    let body = String::from_utf8_lossy(&body).into_owned();

    let request = RecordedRequest {
        method,
        path,
        authorization,
        body,
    };
    let (status, response) = route(&mut lock(state), &request, base);
    lock(state).requests.push(request);
    respond(stream, status, &response)
}

fn route(state: &mut GistState, req: &RecordedRequest, base: &str) -> (u16, String) {
    if let Some(status) = state.fail_next.take() {
        return (status, json!({ "message": "injected failure" }).to_string());
    }
    if !req
        .authorization
        .as_deref()
        .is_some_and(|a| a.starts_with("token ") && a.len() > "token ".len())
    {
        return (401, json!({ "message": "Requires authentication" }).to_string());
    }

    let gist_path = format!("/gists/{}", state.id);
    match (req.method.as_str(), req.path.as_str()) {
        ("GET", p) if p == gist_path && state.exists => (200, state.body(base).to_string()),
        ("PATCH", p) if p == gist_path && state.exists => {
            let Ok(update) = serde_json::from_str::<Value>(&req.body) else {
                return (422, json!({ "message": "Problems parsing JSON" }).to_string());
            };
            apply_files(state, &update);
            state.commit();
            (200, state.body(base).to_string())
        }
        ("POST", "/gists") => {
            let Ok(create) = serde_json::from_str::<Value>(&req.body) else {
                return (422, json!({ "message": "Problems parsing JSON" }).to_string());
            };
            state.files.clear();
            state.history.clear();
            apply_files(state, &create);
            state.public = create["public"].as_bool().unwrap_or(false);
            state.exists = true;
            state.commit();
            (201, state.body(base).to_string())
        }
        ("GET", p) if p.starts_with("/raw/") => match state.files.get(&p["/raw/".len()..]) {
            Some(content) => (200, content.clone()),
            None => (404, "Not Found".to_string()),
        },
        _ => (404, json!({ "message": "Not Found" }).to_string()),
    }
}

fn apply_files(state: &mut GistState, body: &Value) {
    if let Some(files) = body["files"].as_object() {
        for (name, file) in files {
            if let Some(content) = file["content"].as_str() {
                state.files.insert(name.clone(), content.to_string());
            }
        }
    }
}

fn respond(mut stream: TcpStream, status: u16, body: &str) -> io::Result<()> {
    let reason = match status {
        200 => "OK",
        201 => "Created",
        401 => "Unauthorized",
        404 => "Not Found",
        422 => "Unprocessable Entity",
        _ => "Error",
    };
    write!(
        stream,
        "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )?;
    stream.flush()
}
