// Built with `--features gui` for `header_type: gui` executables, so the
// launcher opens no console window of its own.
#![cfg_attr(all(windows, feature = "gui"), windows_subsystem = "windows")]

fn main() {
    std::process::exit(jrelauncher_lib::run());
}
