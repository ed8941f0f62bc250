//! Ring buffer for debugging drivers
//!
//! This contains an implementation for a static, global ring buffer designed
//! to be used to instrument arbitrary contexts.  While there is nothing to
//! prevent these ring buffers from being left in production code, the design
//! center is primarily around debugging in development: the ring buffers
//! themselves can be dumped with a debugger by printing the `RINGBUF`
//! static of the module of interest.
//!
//! Ring buffers are instantiated with the [`ringbuf!`] macro, to which one
//! must provide the type of per-entry payload, the number of entries, and a
//! static initializer.  For example, to define a 16-entry ring buffer with
//! each entry containing a `u32`:
//!
//! ```ignore
//! ringbuf!(u32, 16, 0);
//! ```
//!
//! Ring buffer entries are generated with [`ringbuf_entry!`] specifying a
//! payload of the appropriate type, e.g.:
//!
//! ```ignore
//! ringbuf_entry!(Trace::Detected(addr));
//! ```

#![cfg_attr(not(test), no_std)]

///
/// The structure of a single [`Ringbuf`] entry, carrying a payload of
/// arbitrary type.  When a ring buffer entry is generated with an identical
/// payload to the most recent entry (in terms of both `line` and `payload`),
/// `count` will be incremented rather than generating a new entry.
///
#[derive(Debug, Copy, Clone)]
pub struct RingbufEntry<T: Copy + PartialEq> {
    pub line: u16,
    pub generation: u16,
    pub count: u32,
    pub payload: T,
}

///
/// A ring buffer of parametrized type and size.  This should be instantiated
/// with the [`ringbuf!`] macro.
///
#[derive(Debug)]
pub struct Ringbuf<T: Copy + PartialEq, const N: usize> {
    pub last: Option<usize>,
    pub total: u32,
    pub buffer: [RingbufEntry<T>; N],
}

impl<T: Copy + PartialEq, const N: usize> Ringbuf<T, { N }> {
    pub const fn new(init: T) -> Self {
        Self {
            last: None,
            total: 0,
            buffer: [RingbufEntry {
                line: 0,
                generation: 0,
                count: 0,
                payload: init,
            }; N],
        }
    }

    pub fn entry(&mut self, line: u16, payload: T) {
        self.total = self.total.wrapping_add(1);

        let ndx = match self.last {
            None => 0,
            Some(last) => {
                let ent = &mut self.buffer[last];

                if ent.line == line && ent.payload == payload {
                    ent.count += 1;
                    return;
                }

                if last + 1 >= self.buffer.len() {
                    0
                } else {
                    last + 1
                }
            }
        };

        let ent = &mut self.buffer[ndx];
        ent.line = line;
        ent.payload = payload;
        ent.count = 1;
        ent.generation = ent.generation.wrapping_add(1);

        self.last = Some(ndx);
    }
}

///
/// Defines a static ring buffer with a payload type of `$ptype` and `$size`
/// entries.  Because the ring buffer is static, `$pinit` must be provided to
/// statically initialize the payloads of the ring buffer.  An entry is
/// recorded in the ring buffer with a call to [`ringbuf_entry!`].
///
#[cfg(not(feature = "disabled"))]
#[macro_export]
macro_rules! ringbuf {
    ($ptype:ty, $size:expr, $pinit:expr) => {
        #[cfg(not(test))]
        #[allow(dead_code)]
        static mut RINGBUF: $crate::Ringbuf<$ptype, $size> =
            $crate::Ringbuf::new($pinit);

        // The test harness runs tests on multiple threads; give each
        // thread its own buffer so entries stay race-free.
        #[cfg(test)]
        ::std::thread_local! {
            #[allow(dead_code)]
            static RINGBUF: ::core::cell::RefCell<
                $crate::Ringbuf<$ptype, $size>,
            > = ::core::cell::RefCell::new($crate::Ringbuf::new($pinit));
        }
    };
}

#[cfg(feature = "disabled")]
#[macro_export]
macro_rules! ringbuf {
    ($ptype:ty, $size:expr, $pinit:expr) => {};
}

///
/// Adds an entry to a ring buffer that has been declared with [`ringbuf!`].
/// The line number of the call will be recorded, along with the payload.  If
/// the ring buffer is full, the oldest entry in the ring buffer will be
/// overwritten.  If the line number and the payload both match the most
/// recent entry in the ring buffer, no new entry will be added, and the
/// count of the last entry will be incremented.
///
#[cfg(not(feature = "disabled"))]
#[macro_export]
macro_rules! ringbuf_entry {
    ($payload:expr) => {{
        #[cfg(not(test))]
        {
            // Safety: the static flavor of the buffer is only ever
            // touched from a single execution context, through this
            // macro.
            let ringbuf =
                unsafe { &mut *core::ptr::addr_of_mut!(RINGBUF) };
            ringbuf.entry(line!() as u16, $payload);
        }

        #[cfg(test)]
        RINGBUF.with(|r| r.borrow_mut().entry(line!() as u16, $payload));
    }};
}

#[cfg(feature = "disabled")]
#[macro_export]
macro_rules! ringbuf_entry {
    ($payload:expr) => {
        let _ = &$payload;
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    mod traced {
        ringbuf!(u32, 4, 0);

        pub fn record(v: u32) {
            ringbuf_entry!(v);
        }

        pub fn total() -> u32 {
            RINGBUF.with(|r| r.borrow().total)
        }
    }

    #[test]
    fn entries_from_other_threads_stay_thread_local() {
        let other = std::thread::spawn(|| {
            for i in 0..8 {
                traced::record(i);
            }
            traced::total()
        });

        for i in 0..3 {
            traced::record(i);
        }

        assert_eq!(other.join().unwrap(), 8);
        assert_eq!(traced::total(), 3);
    }

    #[test]
    fn base_state() {
        let buf = Ringbuf::<u32, 4>::new(0);
        assert_eq!(buf.last, None);
        assert_eq!(buf.total, 0);
    }

    #[test]
    fn coalesces_identical_entries() {
        let mut buf = Ringbuf::<u32, 4>::new(0);
        buf.entry(10, 7);
        buf.entry(10, 7);
        buf.entry(10, 7);

        assert_eq!(buf.last, Some(0));
        assert_eq!(buf.buffer[0].count, 3);
        assert_eq!(buf.total, 3);
    }

    #[test]
    fn distinct_lines_do_not_coalesce() {
        let mut buf = Ringbuf::<u32, 4>::new(0);
        buf.entry(10, 7);
        buf.entry(11, 7);

        assert_eq!(buf.last, Some(1));
        assert_eq!(buf.buffer[0].count, 1);
        assert_eq!(buf.buffer[1].count, 1);
    }

    #[test]
    fn wraps_and_bumps_generation() {
        let mut buf = Ringbuf::<u32, 2>::new(0);
        buf.entry(1, 100);
        buf.entry(2, 200);
        buf.entry(3, 300);

        assert_eq!(buf.last, Some(0));
        assert_eq!(buf.buffer[0].payload, 300);
        assert_eq!(buf.buffer[0].generation, 2);
        assert_eq!(buf.buffer[1].payload, 200);
    }
}
