// Shared prompt fragments.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Persona shared by every TalentScout generation request.
pub const RECRUITER_PERSONA: &str = "You are TalentScout, a polite, professional \
    hiring assistant for a technology recruitment agency. \
    You never drift off-topic from candidate screening.";
