use crate::GenerateOptions;

pub(crate) const FUSION_OPTIONS: GenerateOptions = GenerateOptions {
    temperature: Some(0.2),
    num_ctx: Some(2048),
    num_predict: Some(1024),
};

pub(crate) const REPAIR_OPTIONS: GenerateOptions = GenerateOptions {
    temperature: Some(0.2),
    num_ctx: Some(1024),
    num_predict: Some(512),
};

/// Build the fusion system prompt.
pub(crate) fn fusion_system_prompt() -> &'static str {
    r#"You are a microservice architecture fusion engine.
Return ONLY valid JSON matching this schema keys:
{ services:[], apis:[], datastores:[], topics:[], dependencies:[], configs:{}, constraints:{}, deploymentHints:{}, gaps:[], conflicts:[], trace:[] }
Input nodes are {id, label, type}; edges are [from id, to id, protocol].
Rules:
- Do NOT invent info. If missing/uncertain, add an item in "gaps".
- Prefer diagram facts (nodes/edges/protocols) over chat when conflicting; record conflicts.
- Normalize service names to kebab-case; keep original in trace."#
}

pub(crate) fn repair_system_prompt() -> &'static str {
    r#"You returned JSON that failed schema validation.
Repair it to satisfy exactly these keys:
{ services:[], apis:[], datastores:[], topics:[], dependencies:[], configs:{}, constraints:{}, deploymentHints:{}, gaps:[], conflicts:[], trace:[], metadata:{schemaVersion:string, generator:string} }
Keep facts; fix only structure/types. Return ONLY valid JSON."#
}
