/*!
 * # Scoped Debug Levels
 *
 * Components emit log records tagged with a hierarchical scope such as
 * `graph:reload` (the record's `target`). Each scope carries its own
 * severity threshold, held in a process-global scope tree; the effective
 * level of a scope is the maximum level set anywhere along its ancestor
 * chain, so turning a parent up turns its whole subtree up.
 *
 * The tree is configured from a compact spec (the `-d` CLI flag and the
 * `setd` command): a comma-separated list of `scope1:scope2=LVL` entries
 * with `LVL` one of `x` (silent), `e`, `w`, `i`, `t`; an entry without
 * `=` sets the global level. Applying a spec resets the global level to
 * silent first; named scopes persist between applications.
 *
 * The module also owns the debug output sink: stderr by default,
 * switchable to a file. A [`SinkLease`] pins the sink for its lifetime so
 * a multi-record operation cannot have its output split across sinks.
 */

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError, RwLock};

use eyre::{bail, Result};
use once_cell::sync::Lazy;

/// Debug severity. Each level includes everything below it; `Trace` is
/// the most verbose.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    /// Print nothing
    #[default]
    Silent,
    /// Print errors
    Error,
    /// Print warnings and errors
    Warn,
    /// Print informatives and the above
    Info,
    /// Print tracing information and the above
    Trace,
}

impl Level {
    /// Parse a level from its one-letter spec form. Only the first
    /// character is inspected, so the long names parse too.
    pub fn parse(token: &str) -> Result<Self> {
        let level = match token.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('x') => Self::Silent,
            Some('e') => Self::Error,
            Some('w') => Self::Warn,
            Some('i') => Self::Info,
            Some('t') => Self::Trace,
            _ => bail!("bad level `{token}` (expected one of [xewit])"),
        };
        Ok(level)
    }

    /// The `log` filter this level admits.
    fn as_filter(self) -> log::LevelFilter {
        match self {
            Self::Silent => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Default)]
struct ScopeNode {
    level: Level,
    children: HashMap<String, ScopeNode>,
}

static SCOPES: Lazy<RwLock<ScopeNode>> = Lazy::new(|| RwLock::new(ScopeNode::default()));

/// Set the level of one scope path. An empty path addresses the global
/// level. Scope nodes created along the way inherit the level being set;
/// pre-existing intermediate nodes are left untouched.
pub fn set_scope_level(path: &[&str], level: Level) {
    let mut root = SCOPES.write().unwrap_or_else(PoisonError::into_inner);
    let mut node = &mut *root;
    for part in path {
        node = node
            .children
            .entry((*part).to_string())
            .or_insert_with(|| ScopeNode {
                level,
                children: HashMap::new(),
            });
    }
    node.level = level;
}

/// Set the global (root) level.
pub fn set_global(level: Level) {
    set_scope_level(&[], level);
}

/// Effective level of a `:`-separated scope path: the maximum level along
/// the chain from the root to the deepest configured ancestor.
pub fn effective_level(target: &str) -> Level {
    let root = SCOPES.read().unwrap_or_else(PoisonError::into_inner);
    let mut level = root.level;
    let mut node = &*root;
    for part in target.split(':') {
        match node.children.get(part) {
            Some(child) => {
                node = child;
                level = level.max(child.level);
                // Saturated; no deeper scope can raise it further.
                if level == Level::Trace {
                    break;
                }
            }
            None => break,
        }
    }
    level
}

/// Whether a record at `level` under scope `target` should be emitted.
pub fn enabled(target: &str, level: log::Level) -> bool {
    effective_level(target).as_filter() >= level
}

/// Apply a debug spec: `T=D(,T=D)*` where `T` is a `:`-separated scope
/// list and `D` a level letter; a missing `T=` sets the global level. The
/// global level is reset to silent before the spec is applied; scope
/// levels set by earlier specs persist.
pub fn set_from_spec(spec: &str) -> Result<()> {
    set_global(Level::Silent);
    for param in spec.split(',').filter(|p| !p.is_empty()) {
        match param.split_once('=') {
            Some((key, value)) => {
                let scopes: Vec<&str> = key.split(':').filter(|s| !s.is_empty()).collect();
                set_scope_level(&scopes, Level::parse(value)?);
            }
            None => set_global(Level::parse(param)?),
        }
    }
    Ok(())
}

#[derive(Default)]
struct SinkState {
    file: Option<File>,
    leases: usize,
}

static SINK: Lazy<Mutex<SinkState>> = Lazy::new(|| Mutex::new(SinkState::default()));

/// Route debug output to a file instead of stderr. An existing file sink
/// is replaced. Fails while any [`SinkLease`] is outstanding.
pub fn set_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let mut sink = SINK.lock().unwrap_or_else(PoisonError::into_inner);
    if sink.leases > 0 {
        bail!("sink change while a lease is held");
    }
    sink.file = Some(File::create(path)?);
    Ok(())
}

/// Route debug output back to stderr. Fails while any [`SinkLease`] is
/// outstanding.
pub fn unset_file() -> Result<()> {
    let mut sink = SINK.lock().unwrap_or_else(PoisonError::into_inner);
    if sink.leases > 0 {
        bail!("sink change while a lease is held");
    }
    sink.file = None;
    Ok(())
}

/// Pins the current sink for the guard's lifetime: sink changes fail
/// while any lease is held. Operations emitting a correlated sequence of
/// records acquire one so the sequence lands in a single sink.
pub struct SinkLease(());

impl SinkLease {
    pub fn acquire() -> Self {
        let mut sink = SINK.lock().unwrap_or_else(PoisonError::into_inner);
        sink.leases += 1;
        Self(())
    }
}

impl Drop for SinkLease {
    fn drop(&mut self) {
        let mut sink = SINK.lock().unwrap_or_else(PoisonError::into_inner);
        sink.leases = sink.leases.saturating_sub(1);
    }
}

/// Writer handed to the log dispatch: routes each record to the sink
/// current at write time.
pub struct SinkWriter;

impl Write for SinkWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut sink = SINK.lock().unwrap_or_else(PoisonError::into_inner);
        match sink.file.as_mut() {
            Some(file) => file.write(buf),
            None => io::stderr().write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut sink = SINK.lock().unwrap_or_else(PoisonError::into_inner);
        match sink.file.as_mut() {
            Some(file) => file.flush(),
            None => io::stderr().flush(),
        }
    }
}
