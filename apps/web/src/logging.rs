use log::Level;

pub const fn level(debug: bool) -> Level {
    if debug {
        Level::Debug
    } else {
        Level::Info
    }
}

/// Routes `log` records to the console of whichever context loaded the
/// module. The page and the background worker each call this once.
pub fn init(debug: bool) {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(level(debug)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_builds_log_more() {
        assert_eq!(level(false), Level::Info);
        assert_eq!(level(true), Level::Debug);
    }
}
