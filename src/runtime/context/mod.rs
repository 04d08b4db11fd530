//! The execution context: owner of every object, the quota they are charged
//! against, the interned strings, the frame stack and the abort state.
//!
//! Property operations live in `property`, the call protocol in
//! `function_call`.

use std::{collections::HashMap, rc::Rc, time::Instant};

#[cfg(feature = "gc-telemetry")]
use crate::runtime::gc::CycleMetrics;
use crate::runtime::{
    builtins::{self, Builtins},
    config::RuntimeConfig,
    error::RuntimeError,
    executor::{NullExecutor, ScriptExecutor},
    frame::Frame,
    gc::{FunctionHandle, GcStats, MemoryQuota, ObjectHandle, ObjectHeap, SweepReport},
    interner::Interner,
    object::{AsObject, OBJECT_SIZE, ObjectKind},
    symbol::Symbol,
    value::{Value, format_number},
};

mod function_call;
mod names;
mod property;

pub(crate) use names::Names;
pub use property::{PROTOTYPE_RECURSION_LIMIT, Resolved};

/// Coarse lifecycle of a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// No frame is active; the host may run scripts.
    Idle,
    /// At least one frame is on the stack.
    Running,
    /// A fatal fault occurred; nothing will execute any more.
    Aborted,
}

pub struct Context {
    pub(crate) heap: ObjectHeap,
    pub(crate) interner: Interner,
    pub(crate) names: Names,
    pub(crate) builtins: Builtins,
    quota: MemoryQuota,
    config: RuntimeConfig,
    frames: Vec<Frame>,
    stack: Vec<Value>,
    /// Host roots with their registration counts.
    roots: HashMap<ObjectHandle, usize>,
    /// Objects allocated inside the open frames, host scopes or the
    /// running top-level operation. Each frame remembers where its share
    /// starts.
    newborn: Vec<ObjectHandle>,
    /// Open [`Context::scope`] calls.
    host_scopes: usize,
    /// Nesting of public operations; at zero, outside any frame or scope,
    /// the newborn set is released.
    op_depth: usize,
    abort_reason: Option<RuntimeError>,
    executor: Rc<dyn ScriptExecutor>,
    deadline: Option<Instant>,
    /// Set while the built-ins are created; their memory is charged but
    /// never refused.
    bootstrapping: bool,
    objects_reclaimed: usize,
    bytes_reclaimed: usize,
    #[cfg(feature = "gc-telemetry")]
    cycles: Vec<CycleMetrics>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

fn bootstrap_object(heap: &mut ObjectHeap, quota: &mut MemoryQuota) -> ObjectHandle {
    quota.force_charge(OBJECT_SIZE);
    heap.insert(AsObject::new(ObjectKind::Plain, OBJECT_SIZE))
}

impl Context {
    /// Creates a context with the standard built-ins installed on a fresh
    /// global object.
    pub fn new(config: RuntimeConfig) -> Self {
        let mut interner = Interner::new();
        let names = Names::new(&mut interner);
        let mut heap = ObjectHeap::new();
        let mut quota = MemoryQuota::new(config.memory_limit, config.gc_threshold);

        let builtins = Builtins {
            global: bootstrap_object(&mut heap, &mut quota),
            object_prototype: bootstrap_object(&mut heap, &mut quota),
            function_prototype: bootstrap_object(&mut heap, &mut quota),
            array_prototype: bootstrap_object(&mut heap, &mut quota),
            object: None,
            function: None,
            array: None,
        };

        let mut cx = Self {
            heap,
            interner,
            names,
            builtins,
            quota,
            config,
            frames: Vec::new(),
            stack: Vec::new(),
            roots: HashMap::new(),
            newborn: Vec::new(),
            host_scopes: 0,
            op_depth: 0,
            abort_reason: None,
            executor: Rc::new(NullExecutor),
            deadline: None,
            bootstrapping: true,
            objects_reclaimed: 0,
            bytes_reclaimed: 0,
            #[cfg(feature = "gc-telemetry")]
            cycles: Vec::new(),
        };
        builtins::init(&mut cx);
        cx.bootstrapping = false;
        cx.newborn.clear();

        log::debug!(
            "context ready: version {}, {} objects, {} of {} bytes in use",
            cx.config.version,
            cx.heap.live_count(),
            cx.quota.in_use(),
            cx.quota.limit()
        );
        cx
    }

    /// Installs the interpreter that runs scripted frames.
    pub fn set_executor(&mut self, executor: Rc<dyn ScriptExecutor>) {
        self.executor = executor;
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn version(&self) -> u8 {
        self.config.version
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.config.is_case_sensitive()
    }

    // ── Strings ─────────────────────────────────────────────────────────

    /// Interns `s`. Equal strings always yield the same symbol.
    pub fn intern(&mut self, s: &str) -> Symbol {
        self.interner.intern(s)
    }

    /// Text of `symbol`. A symbol from another context is caller misuse
    /// and reads as the empty string.
    pub fn string(&self, symbol: Symbol) -> &str {
        match self.interner.try_resolve(symbol) {
            Some(text) => text,
            None => {
                log::warn!("{} was not interned by this context", symbol);
                ""
            }
        }
    }

    pub fn new_string(&mut self, s: &str) -> Value {
        Value::String(self.interner.intern(s))
    }

    // ── Built-ins ───────────────────────────────────────────────────────

    pub fn global(&self) -> ObjectHandle {
        self.builtins.global
    }

    pub fn object_prototype(&self) -> ObjectHandle {
        self.builtins.object_prototype
    }

    pub fn function_prototype(&self) -> ObjectHandle {
        self.builtins.function_prototype
    }

    pub fn array_prototype(&self) -> ObjectHandle {
        self.builtins.array_prototype
    }

    pub fn object_constructor(&self) -> Option<FunctionHandle> {
        self.builtins.object
    }

    pub fn function_constructor(&self) -> Option<FunctionHandle> {
        self.builtins.function
    }

    pub fn array_constructor(&self) -> Option<FunctionHandle> {
        self.builtins.array
    }

    // ── Memory ──────────────────────────────────────────────────────────

    /// Charges `size` bytes against the quota.
    ///
    /// When the charge does not fit, a collection runs first (objects still
    /// owned by an open frame, scope or operation stay alive) and the charge
    /// is retried. Returns `false` when memory is still short; the caller must
    /// then undo any partial work.
    pub fn use_mem(&mut self, size: usize) -> bool {
        if self.bootstrapping {
            self.quota.force_charge(size);
            return true;
        }
        if !self.quota.fits(size) && self.config.gc_enabled {
            log::debug!(
                "quota exhausted ({} of {} bytes); collecting",
                self.quota.in_use(),
                self.quota.limit()
            );
            self.collect_with(true);
        }
        if self.quota.charge(size) {
            return true;
        }
        log::warn!(
            "out of memory: {} bytes requested, {} available",
            size,
            self.quota.available()
        );
        false
    }

    /// Returns bytes previously charged with [`Context::use_mem`].
    pub fn unuse_mem(&mut self, size: usize) {
        self.quota.credit(size);
    }

    pub fn memory_in_use(&self) -> usize {
        self.quota.in_use()
    }

    pub fn memory_limit(&self) -> usize {
        self.quota.limit()
    }

    pub fn set_memory_limit(&mut self, bytes: usize) {
        self.quota.set_limit(bytes);
    }

    /// Registers a freshly allocated object: charges `size`, runs the kind's
    /// `add` hook and protects it until the enclosing frame, scope or
    /// top-level operation ends.
    pub(crate) fn alloc_object(&mut self, kind: ObjectKind, size: usize) -> Option<ObjectHandle> {
        if !self.use_mem(size) {
            return None;
        }
        let add = crate::runtime::class::class_of(&kind);
        let handle = self.heap.insert(AsObject::new(kind, size));
        self.newborn.push(handle);
        add.add(self, handle);
        Some(handle)
    }

    pub fn live_objects(&self) -> usize {
        self.heap.live_count()
    }

    /// Whether `handle` still refers to a live object.
    pub fn is_live(&self, handle: ObjectHandle) -> bool {
        self.heap.contains(handle)
    }

    // ── Garbage collection ──────────────────────────────────────────────

    /// Keeps `object` alive until a matching [`Context::remove_root`].
    /// Registrations are counted.
    pub fn add_root(&mut self, object: ObjectHandle) {
        *self.roots.entry(object).or_insert(0) += 1;
    }

    pub fn remove_root(&mut self, object: ObjectHandle) {
        match self.roots.get_mut(&object) {
            Some(count) if *count > 1 => *count -= 1,
            Some(_) => {
                self.roots.remove(&object);
            }
            None => log::warn!("removing unregistered root {:?}", object),
        }
    }

    /// Runs a full collection now.
    ///
    /// With no frame or scope open this is a safe point: only objects
    /// reachable from the roots survive.
    pub fn collect(&mut self) -> SweepReport {
        let safe_point = self.is_top_level();
        if safe_point {
            self.newborn.clear();
        }
        self.collect_with(!safe_point)
    }

    /// Runs `body` with every object it allocates protected from collection
    /// until it returns.
    ///
    /// Outside frames and scopes an object is only protected while the
    /// operation that made it runs. Hosts building several objects before
    /// linking them together do it inside a scope; anything that must
    /// outlive the scope has to be stored somewhere reachable or registered
    /// with [`Context::add_root`].
    pub fn scope<R>(&mut self, body: impl FnOnce(&mut Context) -> R) -> R {
        let base = self.newborn.len();
        self.host_scopes += 1;
        let result = body(self);
        self.host_scopes -= 1;
        self.newborn.truncate(base);
        result
    }

    /// Wraps one public operation. Back at top level, the objects it
    /// allocated lose their protection.
    pub(crate) fn operation<R>(&mut self, op: impl FnOnce(&mut Context) -> R) -> R {
        self.op_depth += 1;
        let result = op(self);
        self.op_depth -= 1;
        if self.op_depth == 0 && self.is_top_level() {
            self.newborn.clear();
        }
        result
    }

    fn is_top_level(&self) -> bool {
        self.frames.is_empty() && self.host_scopes == 0
    }

    /// Collects if memory use has crossed the adaptive threshold.
    pub fn maybe_gc(&mut self) -> bool {
        if !self.config.gc_enabled || !self.quota.over_threshold() {
            return false;
        }
        self.collect();
        true
    }

    fn collect_with(&mut self, keep_newborn: bool) -> SweepReport {
        let started = Instant::now();
        let live_before = self.heap.live_count();
        let used_before = self.quota.in_use();

        let roots = self.root_set(keep_newborn);
        let report = self.heap.collect(&roots);
        self.quota.credit(report.bytes);
        self.quota.adapt_threshold(report.bytes, used_before);
        self.objects_reclaimed += report.objects;
        self.bytes_reclaimed += report.bytes;

        #[cfg(feature = "gc-telemetry")]
        self.cycles.push(CycleMetrics::new(
            self.heap.total_collections(),
            started.elapsed(),
            live_before,
            report.objects,
            report.bytes,
        ));

        log::debug!(
            "gc: {} -> {} objects, {} bytes freed in {:?}, next at {} bytes",
            live_before,
            self.heap.live_count(),
            report.bytes,
            started.elapsed(),
            self.quota.threshold()
        );
        report
    }

    fn root_set(&self, keep_newborn: bool) -> Vec<ObjectHandle> {
        let mut roots = Vec::with_capacity(16 + self.roots.len() + self.stack.len());
        self.builtins.trace(&mut roots);
        roots.extend(self.roots.keys().copied());
        roots.extend(self.stack.iter().filter_map(Value::as_object));
        for frame in &self.frames {
            frame.trace(&mut roots);
        }
        if keep_newborn {
            roots.extend(self.newborn.iter().copied());
        }
        roots
    }

    pub fn gc_stats(&self) -> GcStats {
        GcStats {
            collections: self.heap.total_collections(),
            total_allocations: self.heap.total_allocations(),
            objects_reclaimed: self.objects_reclaimed,
            bytes_reclaimed: self.bytes_reclaimed,
            live_objects: self.heap.live_count(),
            memory_in_use: self.quota.in_use(),
            memory_limit: self.quota.limit(),
            gc_threshold: self.quota.threshold(),
        }
    }

    /// Per-cycle history, oldest first.
    #[cfg(feature = "gc-telemetry")]
    pub fn gc_cycles(&self) -> &[CycleMetrics] {
        &self.cycles
    }

    // ── Abort state ─────────────────────────────────────────────────────

    /// Stops all further execution in this context. The first reason is
    /// kept; later ones are only logged.
    pub fn abort(&mut self, reason: RuntimeError) {
        if let Some(first) = &self.abort_reason {
            log::debug!("already aborted ({}); ignoring {}", first, reason);
            return;
        }
        log::error!("aborting execution: {}", reason);
        self.abort_reason = Some(reason);
    }

    pub fn is_aborted(&self) -> bool {
        self.abort_reason.is_some()
    }

    pub fn abort_reason(&self) -> Option<&RuntimeError> {
        self.abort_reason.as_ref()
    }

    pub fn state(&self) -> ContextState {
        if self.is_aborted() {
            ContextState::Aborted
        } else if self.frames.is_empty() {
            ContextState::Idle
        } else {
            ContextState::Running
        }
    }

    /// Whether execution may go on. Aborts the context once the run
    /// timeout has elapsed.
    pub fn check_continue(&mut self) -> bool {
        if self.is_aborted() {
            return false;
        }
        if let (Some(deadline), Some(millis)) = (self.deadline, self.config.run_timeout_ms) {
            if Instant::now() >= deadline {
                self.abort(RuntimeError::Timeout { millis });
                return false;
            }
        }
        true
    }

    pub(crate) fn ensure_running(&self) -> Result<(), RuntimeError> {
        match &self.abort_reason {
            Some(reason) => Err(RuntimeError::Aborted(reason.to_string())),
            None => Ok(()),
        }
    }

    // ── Frames and the value stack ──────────────────────────────────────

    /// The innermost frame.
    pub fn frame(&self) -> Option<&Frame> {
        self.frames.last()
    }

    pub fn frame_mut(&mut self) -> Option<&mut Frame> {
        self.frames.last_mut()
    }

    pub fn frame_depth(&self) -> usize {
        self.frames.len()
    }

    /// Frames from outermost to innermost.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Pushes `frame`. Objects allocated from now on are protected until it
    /// is popped.
    pub(crate) fn push_frame(&mut self, mut frame: Frame) -> Result<(), RuntimeError> {
        let depth = self.config.max_call_depth;
        if self.frames.len() >= depth {
            let err = RuntimeError::CallDepthExceeded { depth };
            self.abort(err.clone());
            return Err(err);
        }
        if self.frames.is_empty() {
            self.deadline = self
                .config
                .run_timeout_ms
                .map(|millis| Instant::now() + std::time::Duration::from_millis(millis));
        }
        frame.newborn_base = self.newborn.len();
        log::trace!("enter frame {} ({:?})", self.frames.len(), frame.call_kind);
        self.frames.push(frame);
        Ok(())
    }

    /// Pops the innermost frame, dropping whatever it left on the value
    /// stack and the protection of the objects it allocated.
    pub(crate) fn pop_frame(&mut self) -> Option<Frame> {
        let frame = self.frames.pop()?;
        self.stack.truncate(frame.stack_base);
        self.newborn.truncate(frame.newborn_base);
        log::trace!("leave frame {} ({:?})", self.frames.len(), frame.state);
        if self.frames.is_empty() {
            self.deadline = None;
        }
        Some(frame)
    }

    pub fn push_value(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pops the top of the value stack; never below the current frame's
    /// base, where `undefined` is returned instead.
    pub fn pop_value(&mut self) -> Value {
        if self.frame_stack_len() == 0 {
            log::warn!("value stack underflow");
            return Value::Undefined;
        }
        self.stack.pop().unwrap_or_default()
    }

    pub fn stack_len(&self) -> usize {
        self.stack.len()
    }

    /// Values pushed by the current frame.
    pub fn frame_stack_len(&self) -> usize {
        let base = self.frames.last().map_or(0, |frame| frame.stack_base);
        self.stack.len().saturating_sub(base)
    }

    // ── Conversions and diagnostics ─────────────────────────────────────

    /// String conversion used by the built-ins; never calls script code.
    pub fn value_to_string(&self, value: &Value) -> String {
        match value {
            Value::Undefined if self.config.version < 7 => String::new(),
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(sym) => self.string(*sym).to_string(),
            Value::Object(handle) => match self.heap.get(*handle) {
                Some(object) if object.function().is_some() => "[type Function]".to_string(),
                _ => "[object Object]".to_string(),
            },
        }
    }

    pub fn value_to_boolean(&self, value: &Value) -> bool {
        match value {
            Value::String(sym) => {
                let s = self.string(*sym);
                if self.config.version >= 7 {
                    !s.is_empty()
                } else {
                    s.trim()
                        .parse::<f64>()
                        .is_ok_and(|n| n != 0.0 && !n.is_nan())
                }
            }
            other => other.is_truthy(),
        }
    }

    fn debug_value(&self, value: &Value) -> String {
        match value {
            Value::String(sym) => format!("{:?}", self.string(*sym)),
            Value::Object(handle) => format!("<{}>", self.debug(*handle)),
            Value::Undefined => "undefined".to_string(),
            other => self.value_to_string(other),
        }
    }

    /// Multi-line listing of an object's own properties, sorted by name.
    pub fn dump_object(&self, object: ObjectHandle) -> String {
        let mut entries = Vec::new();
        self.foreach(object, |name, value, flags| {
            entries.push((name, value, flags));
            true
        });
        let mut lines: Vec<(String, String)> = entries
            .into_iter()
            .map(|(name, value, flags)| {
                let mut line = format!("{} = {}", self.string(name), self.debug_value(&value));
                if !flags.is_empty() {
                    line.push_str(&format!(" ({:?})", flags));
                }
                (self.string(name).to_string(), line)
            })
            .collect();
        lines.sort();

        let mut out = self.debug(object);
        for (_, line) in lines {
            out.push_str("\n  ");
            out.push_str(&line);
        }
        out
    }
}

#[cfg(test)]
mod function_call_test;
