use tracing::debug;
use tracing::warn;
use windows::Win32::Graphics::Dxgi::*;

pub fn severity_name(severity: DXGI_INFO_QUEUE_MESSAGE_SEVERITY) -> &'static str {
    match severity {
        DXGI_INFO_QUEUE_MESSAGE_SEVERITY_CORRUPTION => "CORRUPTION",
        DXGI_INFO_QUEUE_MESSAGE_SEVERITY_ERROR => "ERROR",
        DXGI_INFO_QUEUE_MESSAGE_SEVERITY_WARNING => "WARNING",
        DXGI_INFO_QUEUE_MESSAGE_SEVERITY_INFO => "INFO",
        DXGI_INFO_QUEUE_MESSAGE_SEVERITY_MESSAGE => "MESSAGE",
        _ => "UNKNOWN",
    }
}

/// Drains every stored DXGI debug message into the log.
pub fn log_debug_messages(info_queue: Option<&IDXGIInfoQueue>) {
    let Some(queue) = info_queue else {
        debug!("DXGI info queue not available");
        return;
    };

    let num_messages = unsafe { queue.GetNumStoredMessages(DXGI_DEBUG_ALL) };
    for i in 0..num_messages {
        let mut message_size: usize = 0;
        if unsafe { queue.GetMessage(DXGI_DEBUG_ALL, i, None, &mut message_size) }.is_err() {
            warn!("Error getting size for DXGI message {i}");
            continue;
        }

        // u64 backing keeps the message struct suitably aligned.
        let mut storage = vec![0u64; message_size.div_ceil(8)];
        let message = storage.as_mut_ptr().cast::<DXGI_INFO_QUEUE_MESSAGE>();
        if unsafe { queue.GetMessage(DXGI_DEBUG_ALL, i, Some(message), &mut message_size) }
            .is_err()
        {
            warn!("Error getting data for DXGI message {i}");
            continue;
        }

        let (severity, id, description) = unsafe {
            let message = &*message;
            let bytes = std::slice::from_raw_parts(
                message.pDescription as *const u8,
                message.DescriptionByteLength,
            );
            (
                message.Severity,
                message.ID,
                String::from_utf8_lossy(bytes)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string(),
            )
        };
        warn!("DXGI [{} ID:{}]: {}", severity_name(severity), id, description);
    }
    unsafe { queue.ClearStoredMessages(DXGI_DEBUG_ALL) };
}
