//! Resource limit syscalls

use log::{debug, warn};

use crate::context::RegisterFile;
use crate::error::Result;
use crate::handles;
use crate::kernel::Kernel;
use crate::memory::GuestMemory;
use crate::objects::process::{application_limit, process_name, resource};
use crate::result::ResultCode;

// Result GetResourceLimit(Handle* resourceLimit, Handle process)
pub(super) fn svc_get_resource_limit(kernel: &mut Kernel, regs: &mut RegisterFile) -> Result<()> {
    let handle_pointer = regs[0];
    let pid = regs[1];
    debug!(
        "GetResourceLimit(handle pointer = {:#010X}, process = {:#X})",
        handle_pointer, pid
    );

    match kernel.store.process_from_pid(pid) {
        Some((_, process)) => {
            let limit = process.limits.handle;
            regs.set_result(ResultCode::Success);
            regs[1] = limit;
        }
        None => regs.set_result(ResultCode::BadHandle),
    }
    Ok(())
}

/// Arguments shared by both value queries
struct ValuesRequest {
    values: u32,
    limit: u32,
    names: u32,
    count: u32,
}

impl ValuesRequest {
    fn from_regs(regs: &RegisterFile) -> Self {
        let mut count = regs[3];
        // No request can name more resources than exist
        if count > resource::COUNT {
            warn!(
                "resource limit query for {} values, clamping to {}",
                count as i32,
                resource::COUNT
            );
            count = resource::COUNT;
        }

        Self {
            values: regs[0],
            limit: regs[1],
            names: regs[2],
            count,
        }
    }

    /// Call `value` for every requested resource id and store the results
    fn write_values(
        &self,
        mem: &mut dyn GuestMemory,
        mut value: impl FnMut(u32) -> Result<u64>,
    ) -> Result<()> {
        for i in 0..self.count {
            let name = mem.read32(self.names.wrapping_add(i.wrapping_mul(4)));
            let result = value(name)?;
            mem.write64(self.values.wrapping_add(i.wrapping_mul(8)), result);
        }
        Ok(())
    }
}

/// Resolve the parent process of a resource limit handle
///
/// Returns `None` when `limit` is not a resource limit.
fn limit_owner(kernel: &Kernel, limit: u32) -> Result<Option<u32>> {
    let Some(limit) = kernel.store.resource_limit(limit) else {
        return Ok(None);
    };

    // Only the current process can be named
    let pid = if limit.process == kernel.store.current_process() {
        handles::CURRENT_PROCESS
    } else {
        limit.process
    };
    debug!("resource limits of process \"{}\"", process_name(pid)?);
    Ok(Some(limit.process))
}

// Result GetResourceLimitLimitValues(s64* values, Handle resourceLimit, LimitableResource* names, s32 nameCount)
pub(super) fn svc_get_resource_limit_limit_values(
    kernel: &mut Kernel,
    regs: &mut RegisterFile,
    mem: &mut dyn GuestMemory,
) -> Result<()> {
    let request = ValuesRequest::from_regs(regs);
    debug!(
        "GetResourceLimitLimitValues(values = {:#010X}, handle = {:#X}, names = {:#010X}, count = {})",
        request.values, request.limit, request.names, request.count
    );

    if limit_owner(kernel, request.limit)?.is_none() {
        regs.set_result(ResultCode::BadHandle);
        return Ok(());
    }

    request.write_values(mem, |name| application_limit(name).map(u64::from))?;
    regs.set_result(ResultCode::Success);
    Ok(())
}

// Result GetResourceLimitCurrentValues(s64* values, Handle resourceLimit, LimitableResource* names, s32 nameCount)
pub(super) fn svc_get_resource_limit_current_values(
    kernel: &mut Kernel,
    regs: &mut RegisterFile,
    mem: &mut dyn GuestMemory,
) -> Result<()> {
    let request = ValuesRequest::from_regs(regs);
    debug!(
        "GetResourceLimitCurrentValues(values = {:#010X}, handle = {:#X}, names = {:#010X}, count = {})",
        request.values, request.limit, request.names, request.count
    );

    let owner = limit_owner(kernel, request.limit)?;
    let Some(process) = owner.and_then(|owner| kernel.store.process(owner)) else {
        regs.set_result(ResultCode::BadHandle);
        return Ok(());
    };

    let limits = &process.limits;
    request.write_values(mem, |name| {
        limits.current_value(name).map(|value| i64::from(value) as u64)
    })?;
    regs.set_result(ResultCode::Success);
    Ok(())
}
