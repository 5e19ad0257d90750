//! `keel version`.

/// Crate version baked in at compile time.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prints the version, or just the number with `short`.
pub fn run(short: bool) -> Result<i32, Box<dyn std::error::Error>> {
    println!("{}", render(short));
    Ok(0)
}

fn render(short: bool) -> String {
    if short {
        VERSION.to_string()
    } else {
        format!(
            "keel version {VERSION} ({}-{})",
            std::env::consts::OS,
            std::env::consts::ARCH
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_is_bare_version() {
        assert_eq!(render(true), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn long_names_the_tool() {
        let long = render(false);
        assert!(long.starts_with("keel version "));
        assert!(long.contains(env!("CARGO_PKG_VERSION")));
    }
}
