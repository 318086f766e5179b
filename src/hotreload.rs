//! Shader hot reload.
//!
//! [`SourceWatch`] polls the modification times of a vertex/fragment pair.
//! [`HotProgram`] owns the currently bound program and swaps it only when a
//! rebuild succeeds, so a broken edit never replaces a working program.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{HarnessError, Result};

/// Source text of a vertex/fragment pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

/// Modification-time poller for the two shader files.
#[derive(Debug)]
pub struct SourceWatch {
    vertex: PathBuf,
    fragment: PathBuf,
    stamps: [Option<SystemTime>; 2],
}

impl SourceWatch {
    pub fn new(vertex: impl Into<PathBuf>, fragment: impl Into<PathBuf>) -> Self {
        let vertex = vertex.into();
        let fragment = fragment.into();
        let stamps = [modified(&vertex), modified(&fragment)];
        Self {
            vertex,
            fragment,
            stamps,
        }
    }

    /// Returns `true` if either file's modification time differs from the
    /// last poll. A file that can't be stat'ed (e.g. mid-save) counts as
    /// unchanged until it reappears.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        for (path, stamp) in [&self.vertex, &self.fragment]
            .into_iter()
            .zip(self.stamps.iter_mut())
        {
            if let Some(now) = modified(path) {
                if *stamp != Some(now) {
                    *stamp = Some(now);
                    changed = true;
                }
            }
        }
        changed
    }

    pub fn read_sources(&self) -> Result<ShaderSources> {
        Ok(ShaderSources {
            vertex: read(&self.vertex)?,
            fragment: read(&self.fragment)?,
        })
    }

    pub fn paths(&self) -> (&Path, &Path) {
        (&self.vertex, &self.fragment)
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| HarnessError::ShaderIo {
        path: path.to_path_buf(),
        source,
    })
}

/// What a call to [`HotProgram::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Unchanged,
    Reloaded,
    /// The rebuild failed; the previous program is still in use.
    Failed,
}

/// A program that is rebuilt from its sources when they change on disk.
pub struct HotProgram<P> {
    watch: SourceWatch,
    program: P,
    generation: u64,
    last_error: Option<String>,
}

impl<P> HotProgram<P> {
    /// Builds the initial program. There is nothing to fall back to yet, so
    /// failure here is returned to the caller.
    pub fn load(
        watch: SourceWatch,
        build: impl FnOnce(&ShaderSources) -> Result<P>,
    ) -> Result<Self> {
        let sources = watch.read_sources()?;
        let program = build(&sources)?;
        Ok(Self {
            watch,
            program,
            generation: 0,
            last_error: None,
        })
    }

    /// Rebuilds the program if its sources changed since the last call.
    ///
    /// On failure the error is logged and kept for display; the old program
    /// stays bound and the next file change triggers another attempt.
    pub fn update(&mut self, build: impl FnOnce(&ShaderSources) -> Result<P>) -> ReloadOutcome {
        if !self.watch.poll() {
            return ReloadOutcome::Unchanged;
        }
        match self.watch.read_sources().and_then(|s| build(&s)) {
            Ok(program) => {
                self.program = program;
                self.generation += 1;
                self.last_error = None;
                log::info!("Reloaded shader program (generation {})", self.generation);
                ReloadOutcome::Reloaded
            }
            Err(e) => {
                log::error!("Shader reload failed, keeping previous program: {e}");
                self.last_error = Some(e.to_string());
                ReloadOutcome::Failed
            }
        }
    }

    pub fn program(&self) -> &P {
        &self.program
    }

    /// Number of successful reloads.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn watch(&self) -> &SourceWatch {
        &self.watch
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::fs::File;
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    struct Fixture {
        _dir: tempfile::TempDir,
        vert: PathBuf,
        frag: PathBuf,
        base: SystemTime,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let vert = dir.path().join("quad.vert");
            let frag = dir.path().join("quad.frag");
            let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
            let fixture = Self {
                _dir: dir,
                vert,
                frag,
                base,
            };
            fixture.write(&fixture.vert, "void main() {}", 0);
            fixture.write(&fixture.frag, "void main() {}", 0);
            fixture
        }

        /// Writes `text` and pins the mtime so tests don't depend on clock
        /// resolution.
        fn write(&self, path: &Path, text: &str, tick: u64) {
            let mut file = File::create(path).unwrap();
            file.write_all(text.as_bytes()).unwrap();
            file.set_modified(self.base + Duration::from_secs(tick))
                .unwrap();
        }

        fn watch(&self) -> SourceWatch {
            SourceWatch::new(&self.vert, &self.frag)
        }
    }

    /// Stand-in for the GL compiler: hands out increasing ids and rejects
    /// sources containing `error`.
    struct FakeCompiler {
        next_id: Cell<u32>,
    }

    impl FakeCompiler {
        fn new() -> Self {
            Self {
                next_id: Cell::new(1),
            }
        }

        fn build(&self, sources: &ShaderSources) -> Result<u32> {
            if sources.fragment.contains("error") {
                return Err(HarnessError::ShaderCompileFailed {
                    stage: "fragment",
                    log: "0:1: syntax error".into(),
                });
            }
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            Ok(id)
        }
    }

    #[test]
    fn unchanged_sources_keep_program() {
        let fx = Fixture::new();
        let compiler = FakeCompiler::new();
        let mut hot = HotProgram::load(fx.watch(), |s| compiler.build(s)).unwrap();
        let before = *hot.program();

        assert_eq!(hot.update(|s| compiler.build(s)), ReloadOutcome::Unchanged);
        assert_eq!(hot.update(|s| compiler.build(s)), ReloadOutcome::Unchanged);
        assert_eq!(*hot.program(), before);
        assert_eq!(hot.generation(), 0);
    }

    #[test]
    fn modified_source_is_rebuilt() {
        let fx = Fixture::new();
        let compiler = FakeCompiler::new();
        let mut hot = HotProgram::load(fx.watch(), |s| compiler.build(s)).unwrap();
        let before = *hot.program();

        fx.write(&fx.vert, "void main() { gl_Position = vec4(0.0); }", 1);
        assert_eq!(hot.update(|s| compiler.build(s)), ReloadOutcome::Reloaded);
        assert_ne!(*hot.program(), before);
        assert_eq!(hot.generation(), 1);
        assert_eq!(hot.update(|s| compiler.build(s)), ReloadOutcome::Unchanged);
    }

    #[test]
    fn broken_source_rolls_back() {
        let fx = Fixture::new();
        let compiler = FakeCompiler::new();
        let mut hot = HotProgram::load(fx.watch(), |s| compiler.build(s)).unwrap();
        let before = *hot.program();

        fx.write(&fx.frag, "syntax error here", 1);
        assert_eq!(hot.update(|s| compiler.build(s)), ReloadOutcome::Failed);
        assert_eq!(*hot.program(), before);
        assert!(hot.last_error().unwrap().contains("syntax error"));

        // Not retried until the file changes again.
        assert_eq!(hot.update(|s| compiler.build(s)), ReloadOutcome::Unchanged);

        fx.write(&fx.frag, "void main() {}", 2);
        assert_eq!(hot.update(|s| compiler.build(s)), ReloadOutcome::Reloaded);
        assert_ne!(*hot.program(), before);
        assert!(hot.last_error().is_none());
    }

    #[test]
    fn older_timestamp_still_counts_as_change() {
        let fx = Fixture::new();
        let mut watch = fx.watch();
        fx.write(&fx.frag, "void main() {}", 0);
        assert!(!watch.poll());
        // e.g. restored from version control with an older mtime
        File::options()
            .write(true)
            .open(&fx.frag)
            .unwrap()
            .set_modified(fx.base - Duration::from_secs(60))
            .unwrap();
        assert!(watch.poll());
    }

    #[test]
    fn unreadable_source_rolls_back() {
        let fx = Fixture::new();
        let compiler = FakeCompiler::new();
        let mut hot = HotProgram::load(fx.watch(), |s| compiler.build(s)).unwrap();
        let before = *hot.program();

        // Not valid UTF-8, so reading it as text fails.
        let mut file = File::create(&fx.frag).unwrap();
        file.write_all(&[0x66, 0xff, 0xfe, 0x0a]).unwrap();
        file.set_modified(fx.base + Duration::from_secs(1)).unwrap();
        drop(file);

        assert_eq!(hot.update(|s| compiler.build(s)), ReloadOutcome::Failed);
        assert_eq!(*hot.program(), before);
        assert_eq!(hot.generation(), 0);
        let err = hot.last_error().unwrap();
        assert!(err.contains(&fx.frag.display().to_string()));

        fx.write(&fx.frag, "void main() {}", 2);
        assert_eq!(hot.update(|s| compiler.build(s)), ReloadOutcome::Reloaded);
        assert!(hot.last_error().is_none());
    }

    #[test]
    fn vanished_file_is_not_a_change() {
        let fx = Fixture::new();
        let compiler = FakeCompiler::new();
        let mut hot = HotProgram::load(fx.watch(), |s| compiler.build(s)).unwrap();
        std::fs::remove_file(&fx.frag).unwrap();
        assert_eq!(hot.update(|s| compiler.build(s)), ReloadOutcome::Unchanged);
        assert_eq!(*hot.program(), 1);
    }

    #[test]
    fn missing_source_fails_initial_load() {
        let fx = Fixture::new();
        std::fs::remove_file(&fx.vert).unwrap();
        let compiler = FakeCompiler::new();
        let result = HotProgram::load(fx.watch(), |s| compiler.build(s));
        assert!(matches!(result, Err(HarnessError::ShaderIo { .. })));
    }

    #[test]
    fn invalid_initial_source_fails_load() {
        let fx = Fixture::new();
        fx.write(&fx.frag, "error", 0);
        let compiler = FakeCompiler::new();
        let result = HotProgram::load(fx.watch(), |s| compiler.build(s));
        assert!(matches!(result, Err(HarnessError::ShaderCompileFailed { .. })));
    }
}
