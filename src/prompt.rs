// Prompt templates and canned assistant text for the property chat

/// Persona and behavioral rules sent ahead of every user message.
/// Treated as an opaque template; the endpoint receives it verbatim.
pub const SYSTEM_INSTRUCTIONS: &str = "\
You are GharMitra, the AI assistant of a real-estate brokerage. \
Only answer questions about real estate: plots, flats, pricing, site visits, \
documentation, home loans and locality guidance. If asked about anything \
else, politely steer the user back to property topics. \
Keep every reply short, between 1 and 3 lines. \
Reply in the same language the user used: English, Hindi or Hinglish.";

/// Synthetic assistant greeting that seeds every fresh conversation.
pub const DEFAULT_GREETING: &str =
	"Namaste! I'm GharMitra, your property assistant. Ask me about plots, flats, pricing or site visits.";

/// Shown when the endpoint answered but carried no candidate text.
pub const EMPTY_REPLY_FALLBACK: &str = "Sorry, I couldn't respond. Try again.";

/// Shown when the completion request failed outright.
pub const FAILURE_FALLBACK: &str =
	"Sorry, I'm facing some issue right now. Please try again later.";

/// Combine the instruction block with one user message into a single prompt.
pub fn build_prompt(instructions: &str, user_text: &str) -> String {
	format!("{}\n\nUser: {}", instructions, user_text)
}
