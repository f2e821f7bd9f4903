//! Handle namespace
//!
//! Handles are plain `u32`s. The low range `[0, MAX]` is handed out by the
//! object store; everything above it is hardcoded and resolves without any
//! allocation (the current thread/process, one handle per OS service, the
//! shared memory blocks and the HID events).
//!
//! ```text
//! 0x00000000 ..= 0xFFFF7FFF   dynamic (object store)
//! 0xFFFF8000                  current thread
//! 0xFFFF8001                  current process
//! 0xFFFF8002 ..= 0xFFFF800E   services (AC .. PTM)
//! 0xFFFF800F ..= 0xFFFF8010   shared memory (GSP, HID)
//! 0xFFFF8011 ..= 0xFFFF8015   HID events 0..4
//! ```

use static_assertions::{assert_eq_size, const_assert};

/// A guest-visible kernel handle
pub type Handle = u32;

/// Highest handle the object store may allocate
pub const MAX: Handle = 0xFFFF_7FFF;

pub const CURRENT_THREAD: Handle = 0xFFFF_8000;
pub const CURRENT_PROCESS: Handle = 0xFFFF_8001;

/// Network
pub const AC: Handle = 0xFFFF_8002;
/// Applet manager
pub const APT: Handle = 0xFFFF_8003;
/// StreetPass
pub const CECD: Handle = 0xFFFF_8004;
/// Console and region configuration
pub const CFG: Handle = 0xFFFF_8005;
/// Input, including gyro and accelerometer
pub const HID: Handle = 0xFFFF_8006;
/// Friend list
pub const FRD: Handle = 0xFFFF_8007;
/// Filesystem
pub const FS: Handle = 0xFFFF_8008;
/// GSP GPU
pub const GPU: Handle = 0xFFFF_8009;
/// DSP, audio decoding and output
pub const DSP: Handle = 0xFFFF_800A;
/// GSP LCD, display configuration
pub const LCD: Handle = 0xFFFF_800B;
/// Microphone
pub const MIC: Handle = 0xFFFF_800C;
pub const NDM: Handle = 0xFFFF_800D;
/// Power, battery, shell and pedometer state
pub const PTM: Handle = 0xFFFF_800E;

pub const MIN_SERVICE_HANDLE: Handle = AC;
pub const MAX_SERVICE_HANDLE: Handle = PTM;

pub const GSP_SHARED_MEM: Handle = MAX_SERVICE_HANDLE + 1;
pub const HID_SHARED_MEM: Handle = MAX_SERVICE_HANDLE + 2;

pub const MIN_SHARED_MEM_HANDLE: Handle = GSP_SHARED_MEM;
pub const MAX_SHARED_MEM_HANDLE: Handle = HID_SHARED_MEM;

pub const HID_EVENT0: Handle = MAX_SHARED_MEM_HANDLE + 1;
pub const HID_EVENT1: Handle = MAX_SHARED_MEM_HANDLE + 2;
pub const HID_EVENT2: Handle = MAX_SHARED_MEM_HANDLE + 3;
pub const HID_EVENT3: Handle = MAX_SHARED_MEM_HANDLE + 4;
pub const HID_EVENT4: Handle = MAX_SHARED_MEM_HANDLE + 5;

pub const MIN_EVENT_HANDLE: Handle = HID_EVENT0;
pub const MAX_EVENT_HANDLE: Handle = HID_EVENT4;

assert_eq_size!(Handle, u32);
const_assert!(MAX < CURRENT_THREAD);
const_assert!(CURRENT_PROCESS < MIN_SERVICE_HANDLE);
const_assert!(MAX_SERVICE_HANDLE < MIN_SHARED_MEM_HANDLE);
const_assert!(MAX_SHARED_MEM_HANDLE < MIN_EVENT_HANDLE);

/// Returns whether `handle` belongs to one of the OS services
#[inline]
pub const fn is_service_handle(handle: Handle) -> bool {
    handle >= MIN_SERVICE_HANDLE && handle <= MAX_SERVICE_HANDLE
}

/// Returns whether `handle` belongs to one of the services' shared memory blocks
#[inline]
pub const fn is_shared_mem_handle(handle: Handle) -> bool {
    handle >= MIN_SHARED_MEM_HANDLE && handle <= MAX_SHARED_MEM_HANDLE
}

/// Returns whether `handle` is one of the hardcoded event objects
#[inline]
pub const fn is_event_handle(handle: Handle) -> bool {
    handle >= MIN_EVENT_HANDLE && handle <= MAX_EVENT_HANDLE
}

/// Returns whether `handle` lies in the range the object store allocates from
#[inline]
pub const fn is_dynamic_handle(handle: Handle) -> bool {
    handle <= MAX
}

/// Human-readable service tag, for logs only
pub fn service_name(handle: Handle) -> &'static str {
    match handle {
        AC => "AC",
        APT => "APT",
        CECD => "CECD",
        CFG => "CFG",
        HID => "HID",
        FRD => "FRD",
        FS => "FS",
        GPU => "GPU",
        DSP => "DSP",
        LCD => "LCD",
        MIC => "MIC",
        NDM => "NDM",
        PTM => "PTM",
        _ => "Unknown",
    }
}
