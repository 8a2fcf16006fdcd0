use hostpoll::application::config::loader::ConfigLoader;
use hostpoll::application::config::models::Config;
use hostpoll::application::host::PollingHost;
use hostpoll::common::error::{HostError, Result};
use hostpoll::common::logger;
use hostpoll::core::bridge::transport::{ChannelTransport, EnclaveId};
use std::env;
use std::sync::Arc;
use std::time::Duration;

// Enclave-side ids used by the loopback run
const DEMO_ENCLAVE: EnclaveId = EnclaveId(1);
const DEMO_LIST_INDEX: u32 = 0;
const DEMO_FD_ID: u32 = 42;

fn main() {
    let args: Vec<String> = env::args().collect();
    let config = match ConfigLoader::load_or_default(args.get(1).map(String::as_str)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error parsing config file: {}", e);
            std::process::exit(1);
        }
    };

    logger::init(&config.log_filter);

    if let Err(e) = run_loopback(&config) {
        log::error!("loopback failed: {}", e);
        std::process::exit(1);
    }
}

/// Register one end of a pipe, queue a wait, make the pipe readable and
/// print the notification that comes back.
fn run_loopback(config: &Config) -> Result<()> {
    let (transport, deliveries) = ChannelTransport::new();
    let host = PollingHost::linux(config, Arc::new(transport));

    let mut fds = [0; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
        return Err(HostError::last_os_error());
    }
    let (read_end, write_end) = (fds[0], fds[1]);

    let handle = host.create(libc::EPOLL_CLOEXEC)?;
    host.add(handle, read_end, libc::EPOLLIN as u32, DEMO_LIST_INDEX, DEMO_FD_ID)?;
    host.wait(DEMO_ENCLAVE, handle, 4, -1)?;
    log::info!("wait queued on device {}", handle);

    let byte = [1u8];
    if unsafe { libc::write(write_end, byte.as_ptr() as *const libc::c_void, 1) } < 0 {
        return Err(HostError::last_os_error());
    }

    match deliveries.recv_timeout(Duration::from_secs(5)) {
        Ok(delivery) => {
            for record in &delivery.records {
                log::info!(
                    "enclave {}: mask {:#x} list_index {} fd_id {}",
                    delivery.enclave,
                    record.event_mask(),
                    record.list_index(),
                    record.device()
                );
            }
        }
        Err(e) => log::warn!("no notification delivered: {}", e),
    }

    host.delete(handle, read_end)?;
    host.shutdown(handle)?;
    host.close(handle)?;
    unsafe {
        libc::close(read_end);
        libc::close(write_end);
    }
    Ok(())
}
