//! Event handling.
//!
//! This library exposes an event-based interface for reacting
//! to the state changes of the emulator in real-time. [EventListeners](EventListener)
//! can be registered on the [Emulator](crate::emulator::Emulator) with the
//! [add_listener](crate::emulator::Emulator::add_listener) method.
//!
//! A blanket implementation of [EventListener] for all `FnMut(&Event)` is provided.

use std::fmt;

use crate::emulator::Fault;

/// Represents an event that occurred while executing a program.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The program modified the accumulator.
    AccumulatorChange {
        /// The new value of the accumulator.
        data: i8,
    },

    /// The program modified a memory location.
    MemoryChange {
        /// The address of the changed memory location.
        address: u16,

        /// New value of the changed memory location.
        data: u8,
    },

    /// The program called a subroutine.
    Call {
        /// The address of the calling instruction.
        address: u16,

        /// The address of the subroutine.
        target: u16,
    },

    /// The program returned from a subroutine.
    Return {
        /// The address execution resumes at.
        address: u16,
    },

    /// A token was read from the input device.
    Input { data: u8 },

    /// A token was written to the output device.
    Output { data: u8 },

    /// The program halted without an error.
    Halt {
        /// The address of the halting instruction.
        address: u16,
    },

    /// The program was aborted by a fault.
    Fault { fault: Fault },
}

/// Trait for consuming events.
pub trait EventListener {
    /// Called whenever a new event has been created.
    fn event(&mut self, event: &Event);
}

impl<F> EventListener for F where F: FnMut(&Event) {
    fn event(&mut self, event: &Event) {
        self(event)
    }
}

pub(crate) struct EventDispatcher {
    listeners: Vec<Box<dyn EventListener>>,
}

impl EventDispatcher {
    pub fn new() -> EventDispatcher {
        EventDispatcher {
            listeners: Vec::new(),
        }
    }

    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener) as Box<dyn EventListener>)
    }

    pub fn dispatch(&mut self, event: Event) {
        for listener in &mut self.listeners {
            listener.event(&event);
        }
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
