//! In-memory `BlockStore` that records every call.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use dbfs_transfer::MAX_BLOCK_SIZE;

use crate::store::{BlockStore, RemoteStatus, StoreError, StoreFuture, UploadHandle};

/// One recorded store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Mkdirs(String),
    Create { path: String, overwrite: bool },
    AddBlock { handle: i64, len: usize },
    Close(i64),
    GetStatus(String),
    Delete { path: String, recursive: bool },
}

type Hook = Box<dyn FnOnce() + Send>;

enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Default)]
struct Inner {
    nodes: BTreeMap<String, Node>,
    open: HashMap<i64, (String, Vec<u8>)>,
    next_handle: i64,
    calls: Vec<Call>,
    add_block_count: usize,
    fail_add_block_at: Option<usize>,
    hang_add_block_at: Option<usize>,
    fail_create: bool,
    fail_close: bool,
    hang_close: bool,
    fail_mkdirs: bool,
    after_add_block: Option<(usize, Hook)>,
}

pub struct MockStore {
    inner: Mutex<Inner>,
}

impl MockStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_handle: 1,
                ..Default::default()
            }),
        }
    }

    /// Fails the n-th `add_block` call (1-based).
    pub fn fail_add_block_at(self, n: usize) -> Self {
        self.inner.lock().unwrap().fail_add_block_at = Some(n);
        self
    }

    /// Never resolves the n-th `add_block` call (1-based).
    pub fn hang_add_block_at(self, n: usize) -> Self {
        self.inner.lock().unwrap().hang_add_block_at = Some(n);
        self
    }

    pub fn fail_create(self) -> Self {
        self.inner.lock().unwrap().fail_create = true;
        self
    }

    pub fn fail_close(self) -> Self {
        self.inner.lock().unwrap().fail_close = true;
        self
    }

    /// Never resolves `close`.
    pub fn hang_close(self) -> Self {
        self.inner.lock().unwrap().hang_close = true;
        self
    }

    /// Runs `hook` once the n-th `add_block` call (1-based) has succeeded.
    pub fn after_add_block(self, n: usize, hook: impl FnOnce() + Send + 'static) -> Self {
        self.inner.lock().unwrap().after_add_block = Some((n, Box::new(hook)));
        self
    }

    pub fn fail_mkdirs(self) -> Self {
        self.inner.lock().unwrap().fail_mkdirs = true;
        self
    }

    pub fn insert_dir(&self, path: &str) {
        self.inner
            .lock()
            .unwrap()
            .nodes
            .insert(path.to_string(), Node::Dir);
    }

    pub fn insert_file(&self, path: &str, data: &[u8]) {
        self.inner
            .lock()
            .unwrap()
            .nodes
            .insert(path.to_string(), Node::File(data.to_vec()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn block_sizes(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::AddBlock { len, .. } => Some(len),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn file_contents(&self, path: &str) -> Option<Vec<u8>> {
        match self.inner.lock().unwrap().nodes.get(path) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.inner.lock().unwrap().nodes.contains_key(path)
    }

    pub fn open_handles(&self) -> usize {
        self.inner.lock().unwrap().open.len()
    }
}

fn ancestors(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        current.push('/');
        current.push_str(segment);
        out.push(current.clone());
    }
    out
}

fn api_error(code: &str) -> StoreError {
    StoreError::Api {
        status: 500,
        code: code.into(),
        message: "injected failure".into(),
    }
}

impl BlockStore for MockStore {
    fn mkdirs<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        let mut guard = self.inner.lock().unwrap();
        let s = &mut *guard;
        s.calls.push(Call::Mkdirs(path.to_string()));
        let result = if s.fail_mkdirs {
            Err(api_error("INTERNAL_ERROR"))
        } else {
            let mut result = Ok(());
            for dir in ancestors(path) {
                match s.nodes.get(&dir) {
                    Some(Node::File(_)) => {
                        result = Err(StoreError::Conflict(format!("{dir} is a file")));
                        break;
                    }
                    Some(Node::Dir) => {}
                    None => {
                        s.nodes.insert(dir, Node::Dir);
                    }
                }
            }
            result
        };
        Box::pin(async move { result })
    }

    fn create<'a>(&'a self, path: &'a str, overwrite: bool) -> StoreFuture<'a, UploadHandle> {
        let mut guard = self.inner.lock().unwrap();
        let s = &mut *guard;
        s.calls.push(Call::Create {
            path: path.to_string(),
            overwrite,
        });
        let result = match s.nodes.get(path) {
            _ if s.fail_create => Err(api_error("INTERNAL_ERROR")),
            Some(Node::Dir) => Err(StoreError::Conflict(format!("{path} is a directory"))),
            Some(Node::File(_)) if !overwrite => {
                Err(StoreError::Conflict(format!("{path} already exists")))
            }
            _ => {
                let id = s.next_handle;
                s.next_handle += 1;
                s.open.insert(id, (path.to_string(), Vec::new()));
                Ok(UploadHandle::new(id))
            }
        };
        Box::pin(async move { result })
    }

    fn add_block<'a>(
        &'a self,
        handle: &'a UploadHandle,
        data: &'a [u8],
    ) -> StoreFuture<'a, ()> {
        let mut guard = self.inner.lock().unwrap();
        let s = &mut *guard;
        s.calls.push(Call::AddBlock {
            handle: handle.id(),
            len: data.len(),
        });
        s.add_block_count += 1;
        let n = s.add_block_count;

        if s.hang_add_block_at == Some(n) {
            return Box::pin(std::future::pending::<Result<(), StoreError>>());
        }

        let result = if s.fail_add_block_at == Some(n) {
            Err(api_error("INTERNAL_ERROR"))
        } else if data.len() > MAX_BLOCK_SIZE {
            Err(api_error("MAX_BLOCK_SIZE_EXCEEDED"))
        } else {
            match s.open.get_mut(&handle.id()) {
                Some((_, buf)) => {
                    buf.extend_from_slice(data);
                    Ok(())
                }
                None => Err(StoreError::InvalidHandle(handle.id())),
            }
        };
        if result.is_ok() && matches!(s.after_add_block, Some((at, _)) if at == n) {
            if let Some((_, hook)) = s.after_add_block.take() {
                hook();
            }
        }
        Box::pin(async move { result })
    }

    fn close(&self, handle: UploadHandle) -> StoreFuture<'_, ()> {
        let mut guard = self.inner.lock().unwrap();
        let s = &mut *guard;
        s.calls.push(Call::Close(handle.id()));
        if s.hang_close {
            return Box::pin(std::future::pending::<Result<(), StoreError>>());
        }
        let result = if s.fail_close {
            Err(api_error("INTERNAL_ERROR"))
        } else {
            match s.open.remove(&handle.id()) {
                Some((path, data)) => {
                    s.nodes.insert(path, Node::File(data));
                    Ok(())
                }
                None => Err(StoreError::InvalidHandle(handle.id())),
            }
        };
        Box::pin(async move { result })
    }

    fn get_status<'a>(&'a self, path: &'a str) -> StoreFuture<'a, RemoteStatus> {
        let mut guard = self.inner.lock().unwrap();
        let s = &mut *guard;
        s.calls.push(Call::GetStatus(path.to_string()));
        let result = match s.nodes.get(path) {
            Some(Node::Dir) => Ok(RemoteStatus {
                is_directory: true,
                size_bytes: 0,
            }),
            Some(Node::File(data)) => Ok(RemoteStatus {
                is_directory: false,
                size_bytes: data.len() as u64,
            }),
            None if path == "/" => Ok(RemoteStatus {
                is_directory: true,
                size_bytes: 0,
            }),
            None => Err(StoreError::NotFound(path.to_string())),
        };
        Box::pin(async move { result })
    }

    fn delete<'a>(&'a self, path: &'a str, recursive: bool) -> StoreFuture<'a, ()> {
        let mut guard = self.inner.lock().unwrap();
        let s = &mut *guard;
        s.calls.push(Call::Delete {
            path: path.to_string(),
            recursive,
        });
        let prefix = format!("{}/", path.trim_end_matches('/'));
        let result = match s.nodes.get(path) {
            None => Err(StoreError::NotFound(path.to_string())),
            Some(Node::Dir) => {
                let children: Vec<String> = s
                    .nodes
                    .keys()
                    .filter(|k| k.starts_with(&prefix))
                    .cloned()
                    .collect();
                if !children.is_empty() && !recursive {
                    Err(StoreError::Conflict(format!("{path} is not empty")))
                } else {
                    for child in children {
                        s.nodes.remove(&child);
                    }
                    s.nodes.remove(path);
                    Ok(())
                }
            }
            Some(Node::File(_)) => {
                s.nodes.remove(path);
                Ok(())
            }
        };
        Box::pin(async move { result })
    }
}
