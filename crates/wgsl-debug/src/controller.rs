//! Stepping controller
//!
//! [`WgslDebug`] drives a [`WgslExec`] one command at a time and decides
//! where to stop: on breakpoint lines, after a step, when paused from
//! another thread, or when nothing is left to run. Bookkeeping commands
//! without a source line are always stepped through, so a stopped session
//! sits on a line the user can see.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};
use wgsl_exec::{
    BindGroups, Command, DecodedValue, ExecConfig, ExecPosition, InvocationIds, Result,
    StackEntry, WgslExec,
};

/// Why a run or step returned control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Breakpoint(u32),
    Step,
    Pause,
    /// Every frame has run to completion.
    Finished,
}

/// Breakpoint-aware stepping session over one execution.
#[derive(Debug)]
pub struct WgslDebug {
    exec: WgslExec,
    breakpoints: BTreeSet<u32>,
    pause: Arc<AtomicBool>,
    /// Commands run on the current line since arriving on it or last
    /// stopping there.
    visited: HashSet<ExecPosition>,
}

impl WgslDebug {
    pub fn new(exec: WgslExec) -> Self {
        Self {
            exec,
            breakpoints: BTreeSet::new(),
            pause: Arc::new(AtomicBool::new(false)),
            visited: HashSet::new(),
        }
    }

    /// Parse and compile `source` into a new session.
    pub fn from_source(source: &str) -> Result<Self> {
        Ok(Self::new(WgslExec::new(source)?))
    }

    /// Share an existing pause flag, so whoever holds it can interrupt
    /// [`run`](Self::run).
    pub fn with_pause_handle(mut self, pause: Arc<AtomicBool>) -> Self {
        self.pause = pause;
        self
    }

    pub fn exec(&self) -> &WgslExec {
        &self.exec
    }

    pub fn exec_mut(&mut self) -> &mut WgslExec {
        &mut self.exec
    }

    /// Stop before the first module-scope declaration.
    pub fn start(&mut self, config: &ExecConfig) -> Result<()> {
        self.exec.start(config)?;
        self.skip_lineless()
    }

    /// Stop before the first statement of one compute invocation.
    pub fn start_invocation(
        &mut self,
        entry: &str,
        global_id: [u32; 3],
        workgroups: [u32; 3],
        bind_groups: &BindGroups,
        config: &ExecConfig,
    ) -> Result<InvocationIds> {
        let ids = self
            .exec
            .start_invocation(entry, global_id, workgroups, bind_groups, config)?;
        self.skip_lineless()?;
        Ok(ids)
    }

    // === Breakpoints ===

    /// Set a breakpoint on `line`, or remove it if present. Returns whether
    /// the line now has one.
    pub fn toggle_breakpoint(&mut self, line: u32) -> bool {
        if self.breakpoints.remove(&line) {
            false
        } else {
            self.breakpoints.insert(line);
            true
        }
    }

    /// Replace every breakpoint.
    pub fn set_breakpoints(&mut self, lines: impl IntoIterator<Item = u32>) {
        self.breakpoints = lines.into_iter().collect();
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = u32> + '_ {
        self.breakpoints.iter().copied()
    }

    // === Running ===

    /// Flag that makes a running [`run`](Self::run) stop at the next
    /// command boundary.
    pub fn pause_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.pause)
    }

    pub fn pause(&self) {
        self.pause.store(true, Ordering::SeqCst);
    }

    /// Step until a breakpoint line is reached, a pause is requested or
    /// execution finishes. The command under the cursor always runs, so
    /// resuming from a breakpoint moves on.
    pub fn run(&mut self) -> Result<StopReason> {
        self.pause.store(false, Ordering::SeqCst);
        debug!(line = ?self.current_line(), "run");
        self.mark_visited();
        loop {
            if let Some(reason) = self.advance()? {
                return Ok(reason);
            }
        }
    }

    /// Execute one command, following calls into the callee.
    pub fn step_into(&mut self) -> Result<StopReason> {
        if !self.exec.is_running() {
            return Ok(StopReason::Finished);
        }
        self.exec.step_next()?;
        self.skip_lineless()?;
        Ok(self.settled())
    }

    /// Execute one command; a call runs to completion unless it hits a
    /// breakpoint.
    pub fn step_over(&mut self) -> Result<StopReason> {
        if !matches!(self.exec.current_command(), Some(Command::CallExpr { .. })) {
            return self.step_into();
        }
        let depth = self.exec.function_depth();
        self.exec.step_next()?;
        self.finish_calls_above(depth)
    }

    /// Run until the current function returns to its caller.
    pub fn step_out(&mut self) -> Result<StopReason> {
        let depth = self.exec.function_depth();
        if depth == 0 {
            return self.run();
        }
        self.finish_calls_above(depth - 1)
    }

    fn finish_calls_above(&mut self, depth: usize) -> Result<StopReason> {
        self.pause.store(false, Ordering::SeqCst);
        self.mark_visited();
        while self.exec.is_running() && self.exec.function_depth() > depth {
            match self.advance()? {
                None | Some(StopReason::Finished) => {}
                // a stop back at the caller's level is the end of the step
                Some(_) if self.exec.function_depth() <= depth => break,
                Some(reason) => return Ok(reason),
            }
        }
        self.skip_lineless()?;
        Ok(self.settled())
    }

    /// One command of a run. Returns the reason to stop, if any.
    fn advance(&mut self) -> Result<Option<StopReason>> {
        if !self.exec.is_running() {
            return Ok(Some(StopReason::Finished));
        }
        let from = self.current_line();
        self.exec.step_next()?;
        self.skip_lineless()?;
        if !self.exec.is_running() {
            return Ok(Some(StopReason::Finished));
        }
        if self.pause.swap(false, Ordering::SeqCst) {
            debug!(line = ?self.current_line(), "paused");
            return Ok(Some(StopReason::Pause));
        }
        let Some(line) = self.current_line() else {
            return Ok(None);
        };
        if from != Some(line) {
            self.visited.clear();
        }
        // Coming back to a command without leaving its line is a new loop
        // iteration.
        let looped = self
            .exec
            .position()
            .is_some_and(|position| !self.visited.insert(position));
        if self.breakpoints.contains(&line) && (from != Some(line) || looped) {
            debug!(line, looped, "breakpoint");
            self.mark_visited();
            return Ok(Some(StopReason::Breakpoint(line)));
        }
        Ok(None)
    }

    fn mark_visited(&mut self) {
        self.visited.clear();
        self.visited.extend(self.exec.position());
    }

    fn skip_lineless(&mut self) -> Result<()> {
        while self.exec.is_running() && self.exec.current_line().is_none() {
            trace!("skip bookkeeping command");
            self.exec.step_next()?;
        }
        Ok(())
    }

    fn settled(&self) -> StopReason {
        if self.exec.is_running() {
            StopReason::Step
        } else {
            StopReason::Finished
        }
    }

    // === Inspection ===

    pub fn is_finished(&self) -> bool {
        !self.exec.is_running()
    }

    pub fn current_command(&self) -> Option<&Command> {
        self.exec.current_command()
    }

    pub fn current_line(&self) -> Option<u32> {
        self.exec.current_line()
    }

    pub fn call_stack(&self) -> Vec<StackEntry> {
        self.exec.call_stack()
    }

    pub fn get_variable_value(&self, name: &str) -> Option<DecodedValue> {
        self.exec.get_variable_value(name)
    }
}
