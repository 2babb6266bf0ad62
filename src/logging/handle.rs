use tracing_appender::non_blocking::WorkerGuard;

/// Дескриптор жизненного цикла логирования.
///
/// Держит `WorkerGuard` файлового вывода: пока дескриптор жив, фоновый
/// писатель работает; `shutdown` (или drop) сбрасывает буфер на диск.
pub struct LoggingHandle {
    file_guard: Option<WorkerGuard>,
}

impl LoggingHandle {
    pub fn new(file_guard: Option<WorkerGuard>) -> Self {
        Self { file_guard }
    }

    pub fn has_file_sink(&self) -> bool {
        self.file_guard.is_some()
    }

    /// Освобождает guard и дожидается записи буфера в файл.
    pub fn shutdown(mut self) {
        tracing::info!(file_sink = self.has_file_sink(), "Logging shutdown");
        drop(self.file_guard.take());
    }
}

impl Drop for LoggingHandle {
    fn drop(&mut self) {
        if self.file_guard.is_some() {
            eprintln!("WARNING: LoggingHandle dropped without shutdown(), flushing file sink");
        }
    }
}
