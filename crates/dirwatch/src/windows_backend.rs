//! Rename watching with `ReadDirectoryChangesW`.
//!
//! The worker blocks in a synchronous `ReadDirectoryChangesW` call on a
//! directory handle. Stopping sets a flag and cancels the pending call with
//! `CancelIoEx`; a failed read seen while the flag is set ends the loop
//! instead of counting against the failure budget.

use std::ffi::c_void;
use std::io;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;
use std::ptr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use jod_thread::JoinHandle;
use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, ReadDirectoryChangesW, FILE_FLAG_BACKUP_SEMANTICS, FILE_LIST_DIRECTORY,
    FILE_NOTIFY_CHANGE_DIR_NAME, FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE,
    OPEN_EXISTING,
};
use windows_sys::Win32::System::IO::CancelIoEx;

use crate::notify_record::RenamePairs;
use crate::{FailureBudget, RenameHandler, WatchError, MAX_CONSECUTIVE_FAILURES};

/// Size of the change buffer. Generous, since an overflowing buffer makes
/// the OS drop every change it was holding.
const WATCH_BUFFER_LEN: usize = 64000;

/// How many times `stop` re-issues the cancellation while waiting for the
/// worker to leave its blocking call.
const STOP_ATTEMPTS: u32 = 100;
const STOP_RETRY_DELAY: Duration = Duration::from_millis(10);

/// State shared between the worker and whoever stops it.
struct SharedHandle {
    /// `None` once the worker has closed the handle.
    raw: Mutex<Option<HANDLE>>,
    stop_requested: AtomicBool,
}

impl SharedHandle {
    fn cancel_pending_read(&self) {
        let raw = self.raw.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = *raw {
            // SAFETY: the handle is open while it is stored in `raw`, and the
            // worker only closes it after taking it out under this lock.
            unsafe {
                CancelIoEx(handle, ptr::null());
            }
        }
    }
}

/// Closes the directory handle when the worker exits, however it exits.
struct HandleGuard(Arc<SharedHandle>);

impl Drop for HandleGuard {
    fn drop(&mut self) {
        let mut raw = self.0.raw.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(handle) = raw.take() {
            // SAFETY: taken out of `raw`, so this is the only close.
            unsafe {
                CloseHandle(handle);
            }
            log::trace!("Closed watched directory handle");
        }
    }
}

pub(crate) struct Backend {
    shared: Arc<SharedHandle>,
    running: Arc<AtomicBool>,
    job_thread: Option<JoinHandle<()>>,
}

impl Backend {
    pub(crate) fn start(
        path: &Path,
        mut on_rename: RenameHandler,
        running: Arc<AtomicBool>,
    ) -> Result<Self, WatchError> {
        let handle = open_directory(path).map_err(|source| WatchError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let shared = Arc::new(SharedHandle {
            raw: Mutex::new(Some(handle)),
            stop_requested: AtomicBool::new(false),
        });

        let guard = HandleGuard(shared.clone());
        let watched = path.to_path_buf();
        let worker_running = running.clone();

        let job_thread = jod_thread::Builder::new()
            .name("dirwatch worker".to_owned())
            .spawn(move || {
                log::trace!("dirwatch worker started for '{}'", watched.display());
                run(&watched, handle, &guard.0, &mut on_rename);
                drop(guard);
                worker_running.store(false, Ordering::SeqCst);
            });

        let job_thread = match job_thread {
            Ok(job_thread) => job_thread,
            Err(err) => {
                // The closure, and the guard inside it, were dropped with the
                // failed spawn, so the handle is already closed.
                running.store(false, Ordering::SeqCst);
                return Err(WatchError::Spawn(err));
            }
        };

        Ok(Self {
            shared,
            running,
            job_thread: Some(job_thread),
        })
    }

    pub(crate) fn stop(&mut self) {
        let Some(job_thread) = self.job_thread.take() else {
            return;
        };

        self.shared.stop_requested.store(true, Ordering::SeqCst);

        // The worker may be between its stop check and the blocking call, so
        // keep cancelling until it is gone.
        for _ in 0..STOP_ATTEMPTS {
            if !self.running.load(Ordering::SeqCst) {
                job_thread.join();
                return;
            }
            self.shared.cancel_pending_read();
            std::thread::sleep(STOP_RETRY_DELAY);
        }

        log::warn!("dirwatch worker did not stop in time, detaching it");
        job_thread.detach();
    }
}

fn open_directory(path: &Path) -> io::Result<HANDLE> {
    let wide: Vec<u16> = path.as_os_str().encode_wide().chain(Some(0)).collect();

    // SAFETY: `wide` is a null-terminated UTF-16 path that outlives the call.
    let handle = unsafe {
        CreateFileW(
            wide.as_ptr(),
            FILE_LIST_DIRECTORY,
            FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE,
            ptr::null(),
            OPEN_EXISTING,
            FILE_FLAG_BACKUP_SEMANTICS,
            0,
        )
    };

    if handle == INVALID_HANDLE_VALUE {
        Err(io::Error::last_os_error())
    } else {
        Ok(handle)
    }
}

fn run(path: &Path, handle: HANDLE, shared: &SharedHandle, on_rename: &mut RenameHandler) {
    // ReadDirectoryChangesW wants a DWORD-aligned buffer.
    let mut buffer = vec![0u32; WATCH_BUFFER_LEN / 4];
    let buffer_bytes = (buffer.len() * 4) as u32;
    let mut budget = FailureBudget::new();

    loop {
        if shared.stop_requested.load(Ordering::SeqCst) {
            return;
        }

        let mut bytes_returned: u32 = 0;

        // SAFETY: the buffer and `bytes_returned` outlive the synchronous
        // call, and the handle stays open until this function returns.
        let result = unsafe {
            ReadDirectoryChangesW(
                handle,
                buffer.as_mut_ptr() as *mut c_void,
                buffer_bytes,
                0,
                FILE_NOTIFY_CHANGE_DIR_NAME,
                &mut bytes_returned,
                ptr::null_mut(),
                None,
            )
        };

        if result == 0 {
            let err = io::Error::last_os_error();

            if shared.stop_requested.load(Ordering::SeqCst) {
                log::trace!("dirwatch read on '{}' cancelled", path.display());
                return;
            }

            log::error!("ReadDirectoryChangesW failed on '{}': {}", path.display(), err);
            if budget.record_failure() {
                log::error!(
                    "Giving up on watching '{}' after {} consecutive failures",
                    path.display(),
                    MAX_CONSECUTIVE_FAILURES
                );
                return;
            }
            continue;
        }

        budget.reset();

        if bytes_returned == 0 {
            log::warn!(
                "Change buffer for '{}' overflowed, some renames were lost",
                path.display()
            );
            continue;
        }

        // SAFETY: viewing the initialised u32 buffer as bytes; the length is
        // the buffer's own size in bytes.
        let bytes =
            unsafe { std::slice::from_raw_parts(buffer.as_ptr() as *const u8, buffer.len() * 4) };

        for rename in RenamePairs::new(bytes, bytes_returned as usize) {
            log::debug!(
                "Rename in '{}': '{}' -> '{}'",
                path.display(),
                rename.old_name,
                rename.new_name
            );
            on_rename(rename);
        }
    }
}
