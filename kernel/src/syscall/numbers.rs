//! SVC numbers
//!
//! Numbering follows the console kernel. Only the SVCs listed here are
//! dispatched; everything else is reported as unimplemented.

/// Commit or free heap memory (r0 operation, r1 addr0, r2 addr1, r3 size, r4 perms)
pub const SVC_CONTROL_MEMORY: u32 = 0x01;

/// Create an address arbiter (stubbed)
pub const SVC_CREATE_ADDRESS_ARBITER: u32 = 0x21;

/// Close a handle (stubbed, objects are only freed on reset)
pub const SVC_CLOSE_HANDLE: u32 = 0x23;

/// Open a session on a named port (r1 name pointer)
pub const SVC_CONNECT_TO_PORT: u32 = 0x2D;

/// Send an IPC request on a session or to a service handle (r0 handle)
pub const SVC_SEND_SYNC_REQUEST: u32 = 0x32;

/// Get the resource limit handle of a process (r1 process handle)
pub const SVC_GET_RESOURCE_LIMIT: u32 = 0x38;

/// Read resource maxima (r0 values, r1 limit handle, r2 names, r3 count)
pub const SVC_GET_RESOURCE_LIMIT_LIMIT_VALUES: u32 = 0x39;

/// Read current resource usage, same registers as the limit values SVC
pub const SVC_GET_RESOURCE_LIMIT_CURRENT_VALUES: u32 = 0x3A;

/// Print a guest string (r0 pointer, r1 length)
pub const SVC_OUTPUT_DEBUG_STRING: u32 = 0x3D;

/// Name of an SVC for traces
pub const fn name(svc: u32) -> Option<&'static str> {
    let name = match svc {
        SVC_CONTROL_MEMORY => "ControlMemory",
        SVC_CREATE_ADDRESS_ARBITER => "CreateAddressArbiter",
        SVC_CLOSE_HANDLE => "CloseHandle",
        SVC_CONNECT_TO_PORT => "ConnectToPort",
        SVC_SEND_SYNC_REQUEST => "SendSyncRequest",
        SVC_GET_RESOURCE_LIMIT => "GetResourceLimit",
        SVC_GET_RESOURCE_LIMIT_LIMIT_VALUES => "GetResourceLimitLimitValues",
        SVC_GET_RESOURCE_LIMIT_CURRENT_VALUES => "GetResourceLimitCurrentValues",
        SVC_OUTPUT_DEBUG_STRING => "OutputDebugString",
        _ => return None,
    };
    Some(name)
}
