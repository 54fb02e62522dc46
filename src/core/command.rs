use std::fmt;

/// A fully assembled encoder invocation. Never mutated after assembly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FfmpegCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl FfmpegCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn to_args(&self) -> Vec<String> {
        self.args.clone()
    }

    /// Program followed by its arguments.
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::with_capacity(self.args.len() + 1);
        tokens.push(self.program.clone());
        tokens.extend(self.args.iter().cloned());
        tokens
    }

    /// Value following the last occurrence of `flag`, if any.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .windows(2)
            .rev()
            .find(|pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
    }
}

impl fmt::Display for FfmpegCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&shell_words::join(self.tokens()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_start_with_program() {
        let mut cmd = FfmpegCommand::new("ffmpeg");
        cmd.arg("-y").args(["-i", "in.mp4"]).arg("out.mp4");
        assert_eq!(cmd.tokens(), vec!["ffmpeg", "-y", "-i", "in.mp4", "out.mp4"]);
        assert_eq!(cmd.to_args(), vec!["-y", "-i", "in.mp4", "out.mp4"]);
    }

    #[test]
    fn display_quotes_filter_graphs() {
        let mut cmd = FfmpegCommand::new("ffmpeg");
        cmd.args(["-filter_complex", "[bg]copy[v]", "my clip.mp4"]);
        assert_eq!(cmd.to_string(), "ffmpeg -filter_complex '[bg]copy[v]' 'my clip.mp4'");
    }

    #[test]
    fn flag_value_picks_last_occurrence() {
        let mut cmd = FfmpegCommand::new("ffmpeg");
        cmd.args(["-t", "5", "-i", "a.mp3", "-t", "10.0", "out.mp4"]);
        assert_eq!(cmd.flag_value("-t"), Some("10.0"));
        assert_eq!(cmd.flag_value("-map"), None);
    }
}
