use crate::command::Commands;
use crate::event::Events;
use crate::query::Queryer;
use crate::resource::Resources;

/// A system that runs once per update cycle.
///
/// Structural changes go through `commands` and land after every system of
/// the cycle has run. None of the arguments may be kept past the call.
pub trait System: Send {
    fn run(
        &mut self,
        commands: &mut Commands,
        queryer: &mut Queryer<'_>,
        resources: &mut Resources,
        events: &mut Events,
    );
}

/// Blanket implementation so plain functions and closures can be used as systems.
impl<F> System for F
where
    F: FnMut(&mut Commands, &mut Queryer<'_>, &mut Resources, &mut Events) + Send,
{
    fn run(
        &mut self,
        commands: &mut Commands,
        queryer: &mut Queryer<'_>,
        resources: &mut Resources,
        events: &mut Events,
    ) {
        (self)(commands, queryer, resources, events);
    }
}

/// A system that runs once, when the world starts up.
pub trait StartupSystem: Send {
    fn run(&mut self, commands: &mut Commands);
}

impl<F: FnMut(&mut Commands) + Send> StartupSystem for F {
    fn run(&mut self, commands: &mut Commands) {
        (self)(commands);
    }
}

/// The ordered startup and update systems driven by a [`World`](crate::World).
#[derive(Default)]
pub struct SystemSchedule {
    pub(crate) startup: Vec<Box<dyn StartupSystem>>,
    pub(crate) update: Vec<Box<dyn System>>,
}

impl SystemSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a startup system after the ones already registered.
    pub fn add_startup_system<S: StartupSystem + 'static>(&mut self, system: S) -> &mut Self {
        self.startup.push(Box::new(system));
        self
    }

    /// Add an update system to the end of the schedule.
    pub fn add_system<S: System + 'static>(&mut self, system: S) -> &mut Self {
        self.update.push(Box::new(system));
        self
    }

    /// Number of update systems in the schedule.
    pub fn len(&self) -> usize {
        self.update.len()
    }

    pub fn is_empty(&self) -> bool {
        self.update.is_empty()
    }

    pub fn startup_len(&self) -> usize {
        self.startup.len()
    }
}
