// Copyright 2019 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::io;
use std::mem::MaybeUninit;
use std::time::Duration;

///
/// A point-in-time snapshot of this process' resource usage, as reported by `getrusage(2)`.
/// Taken before and after a top-level compiler phase, the difference gives the `time_user` /
/// `time_system` figures in a run `Report`; `mem_virtual`/`mem_resident` are read directly
/// (they are already cumulative, not deltas).
///
#[derive(Clone, Copy, Debug)]
pub struct ResourceSnapshot {
    pub time_user: Duration,
    pub time_system: Duration,
    pub mem_resident_bytes: u64,
}

impl ResourceSnapshot {
    pub fn capture() -> io::Result<ResourceSnapshot> {
        let mut usage = MaybeUninit::<libc::rusage>::uninit();
        // Safety: `getrusage` writes a complete `rusage` struct on success, which is what
        // `RUSAGE_SELF` guarantees here.
        let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, usage.as_mut_ptr()) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        let usage = unsafe { usage.assume_init() };
        Ok(ResourceSnapshot {
            time_user: timeval_to_duration(usage.ru_utime),
            time_system: timeval_to_duration(usage.ru_stime),
            // ru_maxrss is kilobytes on Linux, bytes on macOS; this workspace only targets Linux.
            mem_resident_bytes: (usage.ru_maxrss as u64).saturating_mul(1024),
        })
    }

    pub fn since(&self, earlier: &ResourceSnapshot) -> ResourceSnapshot {
        ResourceSnapshot {
            time_user: self.time_user.saturating_sub(earlier.time_user),
            time_system: self.time_system.saturating_sub(earlier.time_system),
            mem_resident_bytes: self.mem_resident_bytes,
        }
    }
}

fn timeval_to_duration(tv: libc::timeval) -> Duration {
    Duration::new(tv.tv_sec as u64, (tv.tv_usec as u32) * 1000)
}
