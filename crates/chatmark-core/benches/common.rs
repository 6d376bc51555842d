// Shared by the bench targets in this directory; each one only uses part of it.
#[allow(dead_code)]
pub fn generate_chat_reply(sections: usize) -> String {
    let base = "## Step\n\nRun the **build** with `cargo` and check the *output*.\n\n1. First item\n2. Second item\n   - nested ~~old~~ new\n\n```rust\nfn main() {\n    println!(\"hi\");\n}\n```\n\n> A quoted [link](https://example.com) here.\n\n";
    base.repeat(sections)
}

#[allow(dead_code)]
pub fn generate_plain_prose(paragraphs: usize) -> String {
    "Plain words flow through the tokenizer without markup so this measures the text path.\n\n"
        .repeat(paragraphs)
}
