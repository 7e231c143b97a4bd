//! In-process transcoding engine
//!
//! Implements [`TranscodeEngine`] over a `HashMap` virtual file system
//! without invoking any codec. Stream-copy commands copy the input bytes
//! verbatim; re-encode commands write the input prefixed with a marker
//! naming the bitrate, so tests can tell variants apart.
//!
//! Failure injection (`fail_load`, `fail_exec_matching`) and call tracing
//! (`exec_log`, `write_count`) make it suitable as a test double. Concurrent
//! `exec` calls are detected and rejected, mirroring an engine with a
//! single execution context.

use super::{EngineError, TranscodeEngine};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Marker prepended to re-encoded outputs
pub const ENCODED_MARKER: &[u8] = b"BITQUIZ-ENCODED:";

#[derive(Debug, Default)]
struct Inner {
    files: HashMap<String, Vec<u8>>,
    exec_log: Vec<Vec<String>>,
    fail_load: Option<String>,
    fail_exec: Vec<String>,
    writes: usize,
}

/// HashMap-backed engine
#[derive(Debug, Default)]
pub struct InMemoryTranscoder {
    inner: Mutex<Inner>,
    ready: AtomicBool,
    in_flight: AtomicUsize,
}

impl InMemoryTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine that is already loaded
    pub fn ready() -> Self {
        let engine = Self::default();
        engine.ready.store(true, Ordering::SeqCst);
        engine
    }

    /// Make the next `load` calls fail with `reason`
    pub fn fail_load(&self, reason: impl Into<String>) {
        self.lock().fail_load = Some(reason.into());
    }

    /// Let `load` succeed again
    pub fn clear_load_failure(&self) {
        self.lock().fail_load = None;
    }

    /// Fail any `exec` whose arguments contain `needle`
    pub fn fail_exec_matching(&self, needle: impl Into<String>) {
        self.lock().fail_exec.push(needle.into());
    }

    /// Every `exec` invocation seen so far, in call order
    pub fn exec_log(&self) -> Vec<Vec<String>> {
        self.lock().exec_log.clone()
    }

    /// Number of `write_file` calls
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    /// Current virtual file system entry names, sorted
    pub fn file_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().files.keys().cloned().collect();
        names.sort();
        names
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn require_ready(&self) -> Result<(), EngineError> {
        if self.ready.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(EngineError::NotLoaded)
        }
    }

    fn run(&self, args: &[String]) -> Result<(), EngineError> {
        let mut inner = self.lock();
        inner.exec_log.push(args.to_vec());

        if let Some(needle) = inner
            .fail_exec
            .iter()
            .find(|n| args.iter().any(|a| a.contains(n.as_str())))
        {
            return Err(EngineError::ExecFailed(format!("injected failure on '{}'", needle)));
        }

        let input = args
            .iter()
            .position(|a| a == "-i")
            .and_then(|i| args.get(i + 1))
            .ok_or_else(|| EngineError::ExecFailed("missing -i <input>".to_string()))?;
        let output = args
            .last()
            .filter(|o| *o != input)
            .ok_or_else(|| EngineError::ExecFailed("missing output".to_string()))?;

        let source = inner
            .files
            .get(input)
            .cloned()
            .ok_or_else(|| EngineError::FileNotFound(input.clone()))?;

        let stream_copy = args.windows(2).any(|w| w[0] == "-c" && w[1] == "copy");
        let produced = if stream_copy {
            source
        } else {
            let bitrate = args
                .windows(2)
                .find(|w| w[0] == "-b:a")
                .map(|w| w[1].as_str())
                .unwrap_or("default");
            let mut out = Vec::with_capacity(ENCODED_MARKER.len() + bitrate.len() + 1 + source.len());
            out.extend_from_slice(ENCODED_MARKER);
            out.extend_from_slice(bitrate.as_bytes());
            out.push(b':');
            out.extend_from_slice(&source);
            out
        };

        inner.files.insert(output.clone(), produced);
        Ok(())
    }
}

#[async_trait]
impl TranscodeEngine for InMemoryTranscoder {
    async fn load(&self) -> Result<(), EngineError> {
        tokio::task::yield_now().await;
        if let Some(reason) = self.lock().fail_load.clone() {
            return Err(EngineError::LoadFailed(reason));
        }
        self.ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    async fn write_file(&self, name: &str, bytes: &[u8]) -> Result<(), EngineError> {
        self.require_ready()?;
        let mut inner = self.lock();
        inner.writes += 1;
        inner.files.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn read_file(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.require_ready()?;
        self.lock()
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::FileNotFound(name.to_string()))
    }

    async fn list_files(&self, prefix: &str) -> Result<Vec<String>, EngineError> {
        self.require_ready()?;
        let mut names: Vec<String> = self
            .lock()
            .files
            .keys()
            .filter(|name| name.starts_with(prefix))
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }

    async fn delete_file(&self, name: &str) -> Result<(), EngineError> {
        self.require_ready()?;
        match self.lock().files.remove(name) {
            Some(_) => Ok(()),
            None => Err(EngineError::FileNotFound(name.to_string())),
        }
    }

    async fn exec(&self, args: &[String]) -> Result<(), EngineError> {
        self.require_ready()?;

        if self.in_flight.fetch_add(1, Ordering::SeqCst) > 0 {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            return Err(EngineError::ExecFailed(
                "engine is busy with another command".to_string(),
            ));
        }

        // Give an overlapping caller the chance to collide
        tokio::task::yield_now().await;
        let result = self.run(args);

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_requires_load() {
        let engine = InMemoryTranscoder::new();
        assert!(!engine.is_ready());
        assert!(matches!(
            engine.write_file("a", b"x").await,
            Err(EngineError::NotLoaded)
        ));

        engine.load().await.unwrap();
        assert!(engine.is_ready());
        engine.write_file("a", b"x").await.unwrap();
    }

    #[tokio::test]
    async fn test_load_failure_injection() {
        let engine = InMemoryTranscoder::new();
        engine.fail_load("no wasm");
        assert!(matches!(engine.load().await, Err(EngineError::LoadFailed(_))));
        assert!(!engine.is_ready());

        engine.clear_load_failure();
        engine.load().await.unwrap();
        assert!(engine.is_ready());
    }

    #[tokio::test]
    async fn test_copy_and_encode() {
        let engine = InMemoryTranscoder::ready();
        engine.write_file("s_input.wav", b"PCM").await.unwrap();

        engine
            .exec(&args(&["-i", "s_input.wav", "-t", "120", "-c", "copy", "s_original.wav"]))
            .await
            .unwrap();
        assert_eq!(engine.read_file("s_original.wav").await.unwrap(), b"PCM");

        engine
            .exec(&args(&["-i", "s_input.wav", "-b:a", "128k", "s_mp3_128.mp3"]))
            .await
            .unwrap();
        let encoded = engine.read_file("s_mp3_128.mp3").await.unwrap();
        assert!(encoded.starts_with(ENCODED_MARKER));
        assert!(encoded.ends_with(b"128k:PCM"));
        assert_eq!(engine.exec_log().len(), 2);
    }

    #[tokio::test]
    async fn test_exec_failures() {
        let engine = InMemoryTranscoder::ready();
        assert!(matches!(
            engine.exec(&args(&["-i", "missing.wav", "out.mp3"])).await,
            Err(EngineError::FileNotFound(_))
        ));
        assert!(matches!(
            engine.exec(&args(&["out.mp3"])).await,
            Err(EngineError::ExecFailed(_))
        ));

        engine.write_file("in.wav", b"x").await.unwrap();
        engine.fail_exec_matching("320k");
        assert!(matches!(
            engine.exec(&args(&["-i", "in.wav", "-b:a", "320k", "out.mp3"])).await,
            Err(EngineError::ExecFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_list_and_delete_by_prefix() {
        let engine = InMemoryTranscoder::ready();
        engine.write_file("a_1_input.wav", b"x").await.unwrap();
        engine.write_file("a_1_mp3_128.mp3", b"x").await.unwrap();
        engine.write_file("a_10_input.wav", b"x").await.unwrap();

        let names = engine.list_files("a_1_").await.unwrap();
        assert_eq!(names, vec!["a_1_input.wav", "a_1_mp3_128.mp3"]);

        for name in &names {
            engine.delete_file(name).await.unwrap();
        }
        assert_eq!(engine.file_names(), vec!["a_10_input.wav"]);
        assert!(engine.delete_file("a_1_input.wav").await.is_err());
    }
}
