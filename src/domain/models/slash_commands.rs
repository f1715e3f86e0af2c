#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .split_whitespace()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_help()
            || cmd.is_python()
            || cmd.is_lua()
            || cmd.is_language()
            || cmd.is_copy()
            || cmd.is_save()
            || cmd.is_token()
            || cmd.is_cancel()
        {
            return Some(cmd);
        }

        return None;
    }

    fn matches(&self, names: &[&str]) -> bool {
        return names.contains(&self.command.as_str());
    }

    pub fn is_quit(&self) -> bool {
        return self.matches(&["/q", "/quit", "/exit"]);
    }

    pub fn is_help(&self) -> bool {
        return self.matches(&["/h", "/help"]);
    }

    pub fn is_python(&self) -> bool {
        return self.matches(&["/py", "/python"]);
    }

    pub fn is_lua(&self) -> bool {
        return self.matches(&["/lua"]);
    }

    pub fn is_language(&self) -> bool {
        return self.matches(&["/l", "/lang", "/language"]);
    }

    pub fn is_copy(&self) -> bool {
        return self.matches(&["/c", "/copy"]);
    }

    pub fn is_save(&self) -> bool {
        return self.matches(&["/s", "/save"]);
    }

    pub fn is_token(&self) -> bool {
        return self.matches(&["/t", "/token"]);
    }

    pub fn is_cancel(&self) -> bool {
        return self.matches(&["/x", "/cancel"]);
    }
}
