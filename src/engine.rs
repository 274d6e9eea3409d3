//! Best-move lookup through an external UCI engine.
//!
//! The engine runs as a child process for the duration of one query. The
//! process handle lives in [`UciEngine`], whose `Drop` asks the engine to
//! quit and kills it if it does not, so every way out of a query
//! (success, error, timeout) releases the process.
//!
//! Stdout is drained by a reader thread into a channel so that every
//! read can be bounded by the query's deadline. This covers a binary
//! that hangs during startup as well as one that never answers `go`.

use std::{
    env,
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
    sync::mpsc::{self, Receiver, RecvTimeoutError},
    thread,
    time::{Duration, Instant},
};

use log::{debug, error, info, warn};
use shakmaty::{
    CastlingMode, Chess, EnPassantMode, Position, PositionError,
    fen::Fen,
    uci::UciMove,
};

use crate::{config::EngineConfig, error::ReaderError, types::MoveResult};

/// How long an engine gets to exit after `quit` before it is killed.
const QUIT_GRACE: Duration = Duration::from_millis(200);

/// Interval at which a silent engine is checked for having exited.
const EXIT_POLL: Duration = Duration::from_millis(50);

/// Parse a FEN into a playable position.
///
/// Castling rights the board cannot support and surplus material are
/// dropped or tolerated rather than rejected, since encoded boards always
/// claim `KQkq`. Anything else wrong with the position is an error.
pub fn parse_position(fen: &str) -> Result<Chess, ReaderError> {
    let setup = fen.parse::<Fen>()?.into_setup();
    let position = setup
        .position::<Chess>(CastlingMode::Standard)
        .or_else(PositionError::ignore_invalid_castling_rights)
        .or_else(PositionError::ignore_too_much_material)?;

    Ok(position)
}

/// First candidate that exists.
///
/// Paths are checked as given. A bare name (`stockfish`) that is not in
/// the working directory is also looked up on `PATH`.
pub fn locate_engine(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates.iter().find_map(|candidate| {
        if candidate.exists() {
            Some(candidate.clone())
        } else if is_bare_name(candidate) {
            search_path(candidate)
        } else {
            None
        }
    })
}

fn is_bare_name(path: &Path) -> bool {
    path.is_relative() && path.components().count() == 1
}

fn search_path(name: &Path) -> Option<PathBuf> {
    let paths = env::var_os("PATH")?;
    env::split_paths(&paths)
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}

/// Ask the engine for the best move in `fen`.
///
/// Never fails: every problem is logged and turned into
/// [`MoveResult::none`]. The checkmate flag describes the given position,
/// not the one after the returned move.
pub fn get_best_move(fen: &str, config: &EngineConfig) -> MoveResult {
    match query_engine(fen, config) {
        Ok(result) => result,
        Err(e) => {
            match &e {
                ReaderError::InvalidFen(_) | ReaderError::InvalidPosition(_) => {
                    warn!("Invalid board configuration: {e}")
                }
                ReaderError::EngineNotFound => error!("No engine executable found"),
                ReaderError::EngineTerminated => {
                    error!("Engine process terminated unexpectedly")
                }
                ReaderError::IllegalMove(_) => warn!("{e}"),
                _ => error!("Unexpected error in get_best_move: {e:?}"),
            }
            MoveResult::none()
        }
    }
}

fn query_engine(fen: &str, config: &EngineConfig) -> Result<MoveResult, ReaderError> {
    let position = parse_position(fen)?;
    let sanitised = Fen::from_position(&position, EnPassantMode::Legal).to_string();
    debug!("Validated position: {sanitised}");

    let path = locate_engine(&config.candidates).ok_or(ReaderError::EngineNotFound)?;
    info!("Using engine at {}", path.display());

    let uci = {
        let mut engine = UciEngine::spawn(&path, &config.args, config.timeout)?;
        engine.handshake()?;
        engine.best_move(&sanitised, config.move_time)?
    };

    let mv = uci
        .to_move(&position)
        .map_err(|_| ReaderError::IllegalMove(uci.to_string()))?;

    Ok(MoveResult {
        best_move: Some(uci),
        is_checkmate: position.is_checkmate(),
        is_castling: Some(mv.is_castle()),
    })
}

/// A running engine process, terminated on drop.
struct UciEngine {
    child: Child,
    stdin: ChildStdin,
    lines: Receiver<String>,
    deadline: Instant,
    timeout: Duration,
}

impl UciEngine {
    fn spawn(path: &Path, args: &[String], timeout: Duration) -> Result<Self, ReaderError> {
        let deadline = Instant::now() + timeout;
        let mut child = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let Some((stdin, stdout)) = take_pipes(&mut child) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(ReaderError::EngineProtocol(
                "engine pipes unavailable".to_owned(),
            ));
        };

        Ok(Self {
            child,
            stdin,
            lines: spawn_reader(stdout),
            deadline,
            timeout,
        })
    }

    fn send(&mut self, command: &str) -> Result<(), ReaderError> {
        debug!(">> {command}");
        writeln!(self.stdin, "{command}")
            .and_then(|_| self.stdin.flush())
            .map_err(|e| match e.kind() {
                io::ErrorKind::BrokenPipe => ReaderError::EngineTerminated,
                _ => ReaderError::Io(e),
            })
    }

    /// Read lines until one matches, bounded by the deadline.
    ///
    /// An engine that exited is reported as terminated even when a
    /// process it forked still holds stdout open: once the child is gone
    /// and a further poll interval brings no output, the read gives up.
    fn read_until(&mut self, done: impl Fn(&str) -> bool) -> Result<String, ReaderError> {
        let mut exited = false;
        loop {
            let remaining = self.deadline.saturating_duration_since(Instant::now());
            match self.lines.recv_timeout(remaining.min(EXIT_POLL)) {
                Ok(line) => {
                    debug!("<< {line}");
                    let line = line.trim();
                    if done(line) {
                        return Ok(line.to_owned());
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    if Instant::now() >= self.deadline {
                        return Err(ReaderError::EngineTimeout(self.timeout));
                    }
                    if exited {
                        return Err(ReaderError::EngineTerminated);
                    }
                    exited = matches!(self.child.try_wait(), Ok(Some(_)));
                }
                Err(RecvTimeoutError::Disconnected) => return Err(ReaderError::EngineTerminated),
            }
        }
    }

    fn handshake(&mut self) -> Result<(), ReaderError> {
        self.send("uci")?;
        self.read_until(|line| line == "uciok")?;
        self.send("isready")?;
        self.read_until(|line| line == "readyok")?;
        Ok(())
    }

    fn best_move(&mut self, fen: &str, move_time: Duration) -> Result<UciMove, ReaderError> {
        self.send("ucinewgame")?;
        self.send(&format!("position fen {fen}"))?;
        self.send(&format!("go movetime {}", move_time.as_millis()))?;

        let line = self.read_until(|line| line.starts_with("bestmove"))?;
        match line.split_whitespace().nth(1) {
            None | Some("(none)") => Err(ReaderError::EngineProtocol(format!(
                "no move in reply: {line}"
            ))),
            Some(token) => token
                .parse::<UciMove>()
                .map_err(|_| ReaderError::EngineProtocol(format!("unparsable move: {token}"))),
        }
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        let _ = writeln!(self.stdin, "quit").and_then(|_| self.stdin.flush());

        let grace = Instant::now() + QUIT_GRACE;
        while Instant::now() < grace {
            match self.child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) => thread::sleep(Duration::from_millis(10)),
                Err(_) => break,
            }
        }

        warn!("Engine did not quit, killing it");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn take_pipes(child: &mut Child) -> Option<(ChildStdin, ChildStdout)> {
    Some((child.stdin.take()?, child.stdout.take()?))
}

/// Forward stdout lines into a channel.
///
/// The thread is detached and ends at EOF or when the receiver is gone.
/// If the engine forked a process that inherited stdout, EOF only comes
/// when that process exits, so the thread can outlive the query; it then
/// stops at its next line since the receiver was dropped with the engine.
fn spawn_reader(stdout: ChildStdout) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    let _detached = thread::spawn(move || {
        for line in BufReader::new(stdout).lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
