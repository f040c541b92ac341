/// Switches the Windows console to UTF-8 with VT escape handling so the
/// colored table renders instead of printing raw escape codes.
#[cfg(windows)]
pub fn setup_console() {
    use windows_sys::Win32::System::Console::{
        GetConsoleMode, GetStdHandle, SetConsoleMode, SetConsoleOutputCP,
        ENABLE_VIRTUAL_TERMINAL_PROCESSING, STD_OUTPUT_HANDLE,
    };

    const CP_UTF8: u32 = 65001;

    // SAFETY: plain Win32 calls on the process' own stdout handle.
    unsafe {
        SetConsoleOutputCP(CP_UTF8);
        let stdout = GetStdHandle(STD_OUTPUT_HANDLE);
        let mut mode = 0;
        if GetConsoleMode(stdout, &mut mode) == 0 {
            // Redirected output, nothing to enable
            return;
        }
        SetConsoleMode(stdout, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING);
    }
}

#[cfg(not(windows))]
pub fn setup_console() {}
