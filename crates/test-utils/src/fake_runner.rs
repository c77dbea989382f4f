use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use feater_exec::log::{ExecutionLogger, LogFields};
use feater_exec::process::{Invocation, ProcessOutcome, ProcessRunner};
use feater_exec::types::BoxFuture;

/// What the fake runner reports for one invocation.
#[derive(Debug, Clone)]
pub enum Scripted {
    Success,
    Exit(i32),
    LaunchError(io::ErrorKind, String),
}

impl Scripted {
    fn to_outcome(&self) -> ProcessOutcome {
        match self {
            Scripted::Success => ProcessOutcome::Success,
            Scripted::Exit(code) => ProcessOutcome::from_exit_code(*code),
            Scripted::LaunchError(kind, msg) => ProcessOutcome::LaunchFailed {
                error: io::Error::new(*kind, msg.clone()),
            },
        }
    }
}

struct Step {
    outcome: Scripted,
    stdout: Vec<String>,
}

/// A `ProcessRunner` that never spawns anything:
/// - records every invocation it is asked to run
/// - replays scripted outcomes in order, then falls back to `Success`
/// - writes scripted stdout lines to the logger before resolving.
#[derive(Clone, Default)]
pub struct FakeProcessRunner {
    script: Arc<Mutex<VecDeque<Step>>>,
    invocations: Arc<Mutex<Vec<Invocation>>>,
}

impl FakeProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the outcome of the next unscripted invocation.
    pub fn then(self, outcome: Scripted) -> Self {
        self.then_with_output(outcome, Vec::<String>::new())
    }

    pub fn then_with_output<I, S>(self, outcome: Scripted, stdout: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.script.lock().unwrap().push_back(Step {
            outcome,
            stdout: stdout.into_iter().map(Into::into).collect(),
        });
        self
    }

    /// Invocations seen so far, in call order.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

impl ProcessRunner for FakeProcessRunner {
    fn run<'a>(
        &'a self,
        invocation: &'a Invocation,
        logger: &'a ExecutionLogger,
    ) -> BoxFuture<'a, ProcessOutcome> {
        Box::pin(async move {
            self.invocations.lock().unwrap().push(invocation.clone());
            let step = self.script.lock().unwrap().pop_front();

            let Some(step) = step else {
                return ProcessOutcome::Success;
            };

            for line in step.stdout {
                let fields = LogFields::from([("stream".to_string(), "stdout".to_string())]);
                logger
                    .info_with(line, fields)
                    .await
                    .expect("fake runner failed to write output line");
            }
            step.outcome.to_outcome()
        })
    }
}
