//! Spawning and draining the external search processes.

use crate::error::{Error, Result};
use crate::planner::{CommandSpec, SearchPlan};
use crate::result_parser::ResultParser;
use crate::types::ResultSet;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, error, warn};

/// Output of a started search. Dropping it kills every child process.
pub struct SpawnedSearch {
    pub stdout: Box<dyn AsyncRead + Send + Unpin>,
    pub children: Vec<Child>,
}

impl SpawnedSearch {
    /// Output not backed by a process, for hosts and tests with canned data
    pub fn from_reader(reader: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            stdout: Box::new(reader),
            children: Vec::new(),
        }
    }
}

impl std::fmt::Debug for SpawnedSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnedSearch")
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

pub trait SearchRunner: Send + Sync + 'static {
    fn spawn(&self, plan: &SearchPlan) -> Result<SpawnedSearch>;
}

/// Runs the plan's grep stage, piped into the filter stage when present
#[derive(Debug, Clone, Copy, Default)]
pub struct RipgrepRunner;

fn command(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .stderr(Stdio::null())
        .kill_on_drop(true);

    #[cfg(windows)]
    {
        // CREATE_NO_WINDOW
        cmd.creation_flags(0x0800_0000);
    }

    cmd
}

fn spawn_stage(spec: &CommandSpec, stdin: Stdio) -> Result<Child> {
    command(spec)
        .stdin(stdin)
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|source| Error::Spawn {
            program: spec.program.clone(),
            source,
        })
}

impl SearchRunner for RipgrepRunner {
    fn spawn(&self, plan: &SearchPlan) -> Result<SpawnedSearch> {
        let mut grep = spawn_stage(&plan.grep, Stdio::null())?;

        let Some(filter_spec) = &plan.filter else {
            let stdout = grep
                .stdout
                .take()
                .ok_or_else(|| Error::MissingStdout(plan.grep.program.clone()))?;
            return Ok(SpawnedSearch {
                stdout: Box::new(stdout),
                children: vec![grep],
            });
        };

        let grep_stdout: Stdio = grep
            .stdout
            .take()
            .ok_or_else(|| Error::MissingStdout(plan.grep.program.clone()))?
            .try_into()
            .map_err(Error::PipeHandoff)?;

        let mut filter = spawn_stage(filter_spec, grep_stdout)?;
        let stdout = filter
            .stdout
            .take()
            .ok_or_else(|| Error::MissingStdout(filter_spec.program.clone()))?;

        Ok(SpawnedSearch {
            stdout: Box::new(stdout),
            children: vec![grep, filter],
        })
    }
}

/// Drain `search` into a result set, stopping at the result cap or at
/// `deadline`, whichever comes first. Partial output is kept. The children
/// are killed when `search` drops at the end.
pub async fn collect_results(
    search: SpawnedSearch,
    mut parser: ResultParser,
    deadline: Instant,
) -> ResultSet {
    let SpawnedSearch { stdout, children } = search;
    let mut reader = BufReader::new(stdout);
    let mut line = Vec::with_capacity(256);

    loop {
        line.clear();
        match tokio::time::timeout_at(deadline, reader.read_until(b'\n', &mut line)).await {
            Err(_) => {
                debug!(results = parser.len(), "Search deadline reached, keeping partial output");
                break;
            }
            Ok(Ok(0)) => break,
            Ok(Ok(_)) => {
                if !parser.push_line(&String::from_utf8_lossy(&line)) {
                    debug!("Result cap reached");
                    break;
                }
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Failed reading search output");
                break;
            }
        }
    }

    drop(children);
    parser.finish()
}

/// Spawn and collect, degrading every failure to an empty result set
pub async fn run_search<R: SearchRunner + ?Sized>(runner: &R, plan: &SearchPlan) -> ResultSet {
    let deadline = Instant::now() + plan.limits.timeout;
    match runner.spawn(plan) {
        Ok(search) => collect_results(search, ResultParser::for_plan(plan), deadline).await,
        Err(e) => {
            error!(error = %e, query = %plan.query, "Failed to start search");
            ResultSet::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::planner::SearchMode;
    use std::time::Duration;

    fn parser(max: usize) -> ResultParser {
        ResultParser::new(OutputFormat::Lines, SearchMode::Content, max, 200)
    }

    #[tokio::test]
    async fn test_collect_from_reader() {
        let output: &[u8] = b"/proj/a.py:3:foo\n/proj/a.py:9:  foo()\ngarbage\n";
        let set = collect_results(
            SpawnedSearch::from_reader(output),
            parser(10),
            Instant::now() + Duration::from_secs(5),
        )
        .await;
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().line_number, 9);
    }

    #[tokio::test]
    async fn test_collect_respects_cap() {
        let output: &[u8] = b"a:1:x\na:2:x\na:3:x\na:4:x\n";
        let set = collect_results(
            SpawnedSearch::from_reader(output),
            parser(3),
            Instant::now() + Duration::from_secs(5),
        )
        .await;
        assert_eq!(set.len(), 3);
        assert!(set.is_capped());
    }

    #[tokio::test]
    async fn test_collect_handles_invalid_utf8_and_missing_newline() {
        let output: &[u8] = b"a.txt:1:caf\xe9\nb.txt:2:last";
        let set = collect_results(
            SpawnedSearch::from_reader(output),
            parser(10),
            Instant::now() + Duration::from_secs(5),
        )
        .await;
        assert_eq!(set.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_keeps_partial_output() {
        let (mut writer, reader) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(&mut writer, b"a.py:1:first\n")
            .await
            .unwrap();

        // writer stays open, so only the deadline ends the read
        let set = collect_results(
            SpawnedSearch::from_reader(reader),
            parser(10),
            Instant::now() + Duration::from_secs(1),
        )
        .await;
        assert_eq!(set.len(), 1);
        drop(writer);
    }

    struct FailingRunner;

    impl SearchRunner for FailingRunner {
        fn spawn(&self, plan: &SearchPlan) -> Result<SpawnedSearch> {
            Err(Error::Spawn {
                program: plan.grep.program.clone(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_degrades_to_empty() {
        let config = crate::EngineConfig::default();
        let plan = crate::planner::QueryPlanner::new(&config)
            .plan("needle", &Default::default(), &[std::path::PathBuf::from("/proj")])
            .unwrap();
        assert!(run_search(&FailingRunner, &plan).await.is_empty());
    }
}
