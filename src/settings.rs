//! Layered serialization settings: endianness, validation and dry runs.
//!
//! A [Settings] value is one frame. Frames live on a [SettingsStack]; every
//! thread owns a default stack reachable through [current], [update], [push],
//! [pop] and [scope]. Entry points such as [crate::record::Record::serialize]
//! read the top frame of the calling thread's stack, while the `*_with`
//! variants take an explicit frame and never touch the thread-local state.
//!
//! Byte order is resolved from lowest to highest priority: the thread's frame,
//! per-call settings, the record type's endianness, the field's endianness.
//!
//! ```
//! use bytecraft::settings::{self, Endian};
//!
//! let outer = settings::current();
//! {
//!     let scope = settings::scope();
//!     scope.update(|s| s.endian = Endian::Big);
//!     assert_eq!(settings::current().endian, Endian::Big);
//! }
//! assert_eq!(settings::current(), outer);
//! ```

use std::{cell::RefCell, marker::PhantomData};

use log::warn;

/// Requested byte order of multi-byte scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Endian {
    Big,
    Little,
    /// Byte order of the machine running the code.
    #[default]
    Host,
    /// Byte order of the target platform, which is the host's.
    Target,
}

/// Concrete byte order an [Endian] resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    Big,
    Little,
}

impl ByteOrder {
    /// The native byte order of the target architecture.
    pub const fn native() -> Self {
        #[cfg(target_endian = "big")]
        let order = Self::Big;

        #[cfg(target_endian = "little")]
        let order = Self::Little;

        order
    }
}

impl Endian {
    pub fn resolve(self) -> ByteOrder {
        match self {
            Endian::Big => ByteOrder::Big,
            Endian::Little => ByteOrder::Little,
            Endian::Host | Endian::Target => ByteOrder::native(),
        }
    }
}

/// One frame of serialization settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct Settings {
    /// Byte order used by fields without their own override.
    pub endian: Endian,
    /// Whether field validators run on encode and decode.
    pub validate: bool,
    /// Whether decoded enum values must match a declared member (checked only when `validate` is on).
    pub strict_enums: bool,
    /// Skips serialize hooks, leaving the record untouched.
    pub dry_run: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endian: Endian::Host,
            validate: true,
            strict_enums: false,
            dry_run: false,
        }
    }
}

impl Settings {
    pub fn with_endian(mut self, endian: Endian) -> Self {
        self.endian = endian;
        self
    }

    pub fn with_validate(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_strict_enums(mut self, strict_enums: bool) -> Self {
        self.strict_enums = strict_enums;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.endian.resolve()
    }
}

/// A stack of [Settings] frames that always holds at least its base frame.
#[derive(Debug, Clone)]
pub struct SettingsStack {
    frames: Vec<Settings>,
}

impl Default for SettingsStack {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SettingsStack {
    pub fn new(base: Settings) -> Self {
        Self { frames: vec![base] }
    }

    pub fn current(&self) -> &Settings {
        // The base frame is never removed.
        &self.frames[self.frames.len() - 1]
    }

    pub fn current_mut(&mut self) -> &mut Settings {
        let top = self.frames.len() - 1;
        &mut self.frames[top]
    }

    /// Pushes a copy of the top frame and returns it for modification.
    pub fn push(&mut self) -> &mut Settings {
        let top = *self.current();
        self.frames.push(top);
        self.current_mut()
    }

    /// Discards the top frame. The base frame is kept and `None` is returned instead.
    pub fn pop(&mut self) -> Option<Settings> {
        if self.frames.len() == 1 {
            warn!("refusing to pop the base settings frame");
            return None;
        }

        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Pops frames until `depth` remain (never fewer than one).
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth.max(1));
    }
}

thread_local! {
    static STACK: RefCell<SettingsStack> = RefCell::new(SettingsStack::default());
}

/// Top frame of the calling thread's settings stack.
pub fn current() -> Settings {
    STACK.with(|stack| *stack.borrow().current())
}

/// Modifies the top frame of the calling thread's settings stack in place.
///
/// `f` must not call back into this module.
pub fn update(f: impl FnOnce(&mut Settings)) {
    STACK.with(|stack| f(stack.borrow_mut().current_mut()));
}

pub fn push() {
    STACK.with(|stack| {
        stack.borrow_mut().push();
    });
}

pub fn pop() -> Option<Settings> {
    STACK.with(|stack| stack.borrow_mut().pop())
}

/// Pushes a frame that is popped again when the returned guard is dropped.
pub fn scope() -> ScopeGuard {
    let depth = STACK.with(|stack| {
        let mut stack = stack.borrow_mut();
        let depth = stack.depth();
        stack.push();
        depth
    });

    ScopeGuard {
        depth,
        _not_send: PhantomData,
    }
}

/// Restores the settings stack to its depth before [scope] was called.
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ScopeGuard {
    depth: usize,
    // The guard refers to a thread-local stack.
    _not_send: PhantomData<*const ()>,
}

impl ScopeGuard {
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        update(f);
    }

    pub fn set_endian(&self, endian: Endian) {
        update(|s| s.endian = endian);
    }

    pub fn set_validate(&self, validate: bool) {
        update(|s| s.validate = validate);
    }

    pub fn set_dry_run(&self, dry_run: bool) {
        update(|s| s.dry_run = dry_run);
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let _ = STACK.try_with(|stack| stack.borrow_mut().truncate(self.depth));
    }
}
