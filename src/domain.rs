/// Largest accepted size for either source file, in characters.
pub const MAX_SOURCE_CHARS: usize = 100_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    /// Declared in the data model but rejected before execution;
    /// no sandbox command is implemented for it.
    NodeJs,
}

impl Language {
    /// Fixed, language-conventional name of the candidate solution file.
    pub fn solution_file(&self) -> &'static str {
        match self {
            Language::Python => "solution.py",
            Language::NodeJs => "solution.js",
        }
    }

    /// Fixed, language-conventional name of the test file.
    pub fn test_file(&self) -> &'static str {
        match self {
            Language::Python => "test_solution.py",
            Language::NodeJs => "test_solution.js",
        }
    }
}

/// One candidate/test pair to execute. Immutable once accepted; lives
/// only for the duration of a single run.
#[derive(Clone, Debug)]
pub struct ExecutionRequest {
    pub candidate_source: String,
    pub test_source: String,
    pub language: Language,
}

/// Structured outcome of one run. Produced exactly once per request,
/// whether the sandboxed process exited, timed out, or never started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionResult {
    pub success: bool,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}
