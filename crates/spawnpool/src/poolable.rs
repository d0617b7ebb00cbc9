//! Traits for objects that can be pooled

/// Contract every pooled resource obeys.
///
/// The registry drives these hooks; callers never invoke them directly.
/// Between `on_release` and the next `on_acquire` the instance sits in its
/// pool's inactive store and must carry no state from its previous holder.
///
/// # Example
/// ```
/// use spawnpool::Poolable;
///
/// #[derive(Default)]
/// struct Zombie {
///     position: (f32, f32),
///     health: u32,
///     visible: bool,
/// }
///
/// impl Poolable for Zombie {
///     type Placement = (f32, f32);
///
///     fn apply_placement(&mut self, placement: &(f32, f32)) {
///         self.position = *placement;
///     }
///
///     fn on_acquire(&mut self) {
///         self.health = 100;
///         self.visible = true;
///     }
///
///     fn on_release(&mut self) {
///         self.health = 0;
///         self.visible = false;
///     }
/// }
/// ```
pub trait Poolable: Send + 'static {
    /// External state applied at acquire time (position, orientation, ...).
    type Placement;

    /// Apply the acquire-time placement.
    ///
    /// Runs before [`on_acquire`](Self::on_acquire).
    fn apply_placement(&mut self, placement: &Self::Placement);

    /// Bring the instance into a freshly spawned state.
    ///
    /// Called exactly once per acquire, before the handle reaches the caller.
    fn on_acquire(&mut self) {}

    /// Reset all internal state.
    ///
    /// Called exactly once per release, after the caller gives the handle
    /// back. The next acquirer must not observe anything the previous
    /// holder left behind.
    fn on_release(&mut self);
}

/// Constructs new instances for a pool on demand.
///
/// Any `Fn() -> T` closure that is `Send + Sync` is a factory.
pub trait Factory<T>: Send + Sync {
    /// Build one new instance.
    fn create(&self) -> T;
}

impl<T, F> Factory<T> for F
where
    F: Fn() -> T + Send + Sync,
{
    fn create(&self) -> T {
        self()
    }
}

// Standard library implementations

impl Poolable for String {
    type Placement = ();

    fn apply_placement(&mut self, _placement: &()) {}

    fn on_release(&mut self) {
        self.clear();
    }
}

impl<T: Send + 'static> Poolable for Vec<T> {
    type Placement = ();

    fn apply_placement(&mut self, _placement: &()) {}

    fn on_release(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_release_keeps_capacity() {
        let mut s = String::with_capacity(64);
        s.push_str("hello world");

        s.on_release();
        assert_eq!(s, "");
        assert!(s.capacity() >= 64);
    }

    #[test]
    fn test_vec_release_keeps_capacity() {
        let mut v = vec![1, 2, 3, 4, 5];
        let cap = v.capacity();

        v.on_release();
        assert!(v.is_empty());
        assert_eq!(v.capacity(), cap);
    }

    #[test]
    fn test_closure_is_factory() {
        let factory = || String::from("fresh");
        assert_eq!(Factory::create(&factory), "fresh");
    }
}
