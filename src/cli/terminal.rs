//! Terminal UI host: prints the prompt and reads the answer from stdin.

use std::io::{self, BufRead, Write};

use async_trait::async_trait;
use colored::*;
use rategate::{ChoicePrompt, PromptChoice, UiHost};

/// Presents prompts on the controlling terminal.
#[derive(Debug, Default)]
pub struct TerminalHost;

impl TerminalHost {
    pub fn new() -> Self {
        Self
    }
}

fn parse_choice(line: &str, offers_remind: bool) -> Option<PromptChoice> {
    match line.trim().to_ascii_lowercase().as_str() {
        "1" | "r" | "rate" => Some(PromptChoice::Rate),
        "2" | "l" | "later" if offers_remind => Some(PromptChoice::RemindLater),
        "3" | "n" | "no" => Some(PromptChoice::Decline),
        "" | "q" => Some(PromptChoice::Dismissed),
        _ => None,
    }
}

fn read_choice(offers_remind: bool) -> PromptChoice {
    let stdin = io::stdin();
    loop {
        print!("{} ", ">".cyan());
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => return PromptChoice::Dismissed,
            Ok(_) => {}
        }
        match parse_choice(&line, offers_remind) {
            Some(choice) => return choice,
            None => println!("{}", "Please pick one of the listed options".yellow()),
        }
    }
}

#[async_trait]
impl UiHost for TerminalHost {
    async fn present_choice_prompt(&self, prompt: &ChoicePrompt) -> PromptChoice {
        println!();
        println!("{}", prompt.title.bold());
        println!("{}", prompt.message);
        println!("  1) {}", prompt.buttons.rate.green());
        if let Some(remind) = &prompt.buttons.remind_later {
            println!("  2) {}", remind.yellow());
        }
        println!("  3) {}", prompt.buttons.cancel.red());

        let offers_remind = prompt.buttons.remind_later.is_some();
        tokio::task::spawn_blocking(move || read_choice(offers_remind))
            .await
            .unwrap_or(PromptChoice::Dismissed)
    }

    fn dismiss_prompt(&self) {
        println!("{}", "Prompt dismissed".dimmed());
    }

    fn open_review_url(&self, url: &str) {
        println!("{} {}", "Review at:".green(), url);
    }

    fn request_native_review(&self) {
        println!("{}", "Requested the platform review flow".cyan());
    }
}
