//! Kernel facade
//!
//! Ties the object store and the service routing table together behind the
//! one entry point the CPU core calls: [`Kernel::service_svc`].

use log::info;

use crate::config::KernelConfig;
use crate::context::RegisterFile;
use crate::error::Result;
use crate::handles::Handle;
use crate::ipc::{self, Service, ServiceManager};
use crate::memory::GuestMemory;
use crate::objects::ObjectStore;
use crate::syscall;

pub struct Kernel {
    pub(crate) config: KernelConfig,
    pub(crate) store: ObjectStore,
    pub(crate) services: ServiceManager,
}

impl Kernel {
    /// Build a kernel in its boot state
    ///
    /// # Errors
    /// `InvalidConfig` if `config` fails validation.
    pub fn new(config: KernelConfig) -> Result<Self> {
        config.validate()?;

        let mut kernel = Self {
            store: ObjectStore::new(&config),
            services: ServiceManager::new(),
            config,
        };
        kernel.reset()?;
        Ok(kernel)
    }

    /// Tear down every kernel object and reset every service
    ///
    /// Registered service collaborators stay registered.
    pub fn reset(&mut self) -> Result<()> {
        self.store.reset()?;
        self.services.reset();
        info!(
            "kernel reset: current process {}, srv: port {}",
            self.store.current_process(),
            self.store.srv_port()
        );
        Ok(())
    }

    /// Run SVC `svc` against `regs`
    ///
    /// Guest-visible outcomes are written into `regs`. An `Err` is
    /// host-fatal and emulation must not continue.
    pub fn service_svc(
        &mut self,
        svc: u32,
        regs: &mut RegisterFile,
        mem: &mut dyn GuestMemory,
    ) -> Result<()> {
        syscall::handle_syscall(self, svc, regs, mem)
    }

    /// Route requests for a hardcoded service handle to `service`
    pub fn register_service(&mut self, handle: Handle, service: Box<dyn Service>) {
        self.services.register(handle, service);
    }

    /// Address of the IPC message buffer
    #[inline]
    pub fn message_pointer(&self) -> u32 {
        ipc::message_pointer(self.config.tls_base)
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ObjectStore {
        &mut self.store
    }

    pub fn services(&self) -> &ServiceManager {
        &self.services
    }

    pub fn services_mut(&mut self) -> &mut ServiceManager {
        &mut self.services
    }
}
