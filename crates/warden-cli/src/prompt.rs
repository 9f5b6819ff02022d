/// Print `prompt` to stderr and read one line from stdin as a password.
///
/// Keeps secrets out of argv and shell history. The prompt goes to stderr so
/// the password can also be piped in.
pub async fn read_password(prompt: &str) -> anyhow::Result<String> {
    eprint!("{prompt}");
    let line = tokio::task::spawn_blocking(|| {
        let mut input = String::new();
        std::io::stdin().read_line(&mut input).map(|_| input)
    })
    .await??;
    Ok(password_from_line(&line))
}

/// Drop the line terminator only; surrounding spaces belong to the password.
pub fn password_from_line(line: &str) -> String {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_endings_are_stripped() {
        assert_eq!(password_from_line("b4l0u\n"), "b4l0u");
        assert_eq!(password_from_line("b4l0u\r\n"), "b4l0u");
        assert_eq!(password_from_line("b4l0u"), "b4l0u");
    }

    #[test]
    fn test_spaces_are_kept() {
        assert_eq!(password_from_line(" pass phrase \n"), " pass phrase ");
    }

    #[test]
    fn test_empty_input_is_empty() {
        assert_eq!(password_from_line(""), "");
        assert_eq!(password_from_line("\n"), "");
    }
}
