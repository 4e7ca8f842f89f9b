//! Payloads in the shape the legacy auditing service produces, applied to
//! the document it analyzed.

use redline::{apply_all, apply_one, classify, model::AnalysisResult, EditError};

const DOCUMENT: &str = "Art. 1º  Fica.\n§ 1º Texto.\nANEXO\nArt. 10°  Item do MIDR.\n";

const PAYLOAD: &str = r#"{
    "tipo_documento": "Resolução CONDEL",
    "html": "Art. 1<mark id=\"erro_1\" class=\"erro-highlight\">º</mark>  Fica.",
    "erros": [
        {
            "id": "erro_1",
            "regra": "Artigos (Formato)",
            "mensagem": "No 'Art. 1', o símbolo ordinal está incorreto.",
            "contexto": "Resolução",
            "tem_link": true,
            "correcao": {"original": "º", "novo": "°", "span": [6, 7]}
        },
        {
            "id": null,
            "regra": "Parágrafos (Espaçamento)",
            "mensagem": "Após '§ 1°', deve haver exatamente dois espaços.",
            "contexto": "Resolução",
            "tem_link": false,
            "correcao": {"original": "1º ", "novo": "1°  ", "span": [17, 20]}
        },
        {
            "id": null,
            "regra": "Siglas",
            "mensagem": "A sigla 'MIDR' não foi definida.",
            "contexto": "Anexo",
            "tem_link": false,
            "correcao": null
        },
        {
            "id": "erro_2",
            "regra": "Artigos (Formato)",
            "mensagem": "O 'Art. 10' não deve usar o ordinal.",
            "contexto": "Anexo",
            "tem_link": true,
            "correcao": {"original": "10°", "novo": "10.", "span": [38, 41]}
        },
        {
            "id": "erro_3",
            "regra": "Texto",
            "mensagem": "Complete a frase.",
            "contexto": "Resolução",
            "tem_link": true,
            "correcao": {"original": "Fica.", "novo": "Fica aprovado."}
        }
    ]
}"#;

fn payload() -> AnalysisResult {
    serde_json::from_str(PAYLOAD).unwrap()
}

#[test]
fn test_classify_legacy_payload() {
    let result = payload();
    let classes = classify(&result.findings, "Resolução");

    assert_eq!(classes.groups[0].context, "Resolução");
    assert_eq!(classes.groups[0].findings.len(), 3);
    assert_eq!(classes.group("Anexo").unwrap().findings.len(), 2);
    assert_eq!(classes.correctable_count, 4);
    assert_eq!(classes.span_anchored_count, 3);
}

#[test]
fn test_apply_all_legacy_payload() {
    let result = payload();
    let outcome = apply_all(DOCUMENT, &result.findings).unwrap();

    assert_eq!(
        outcome.text,
        "Art. 1°  Fica.\n§ 1°  Texto.\nANEXO\nArt. 10.  Item do MIDR.\n"
    );
    assert_eq!(outcome.applied_count(), 3);
    let order: Vec<usize> = outcome.applied.iter().map(|edit| edit.index).collect();
    assert_eq!(order, vec![3, 1, 0]);

    // The unanchored correction is left for a single apply
    let finished = apply_one(&outcome.text, "Fica.", "Fica aprovado.").unwrap();
    assert!(finished.starts_with("Art. 1°  Fica aprovado.\n"));
}

#[test]
fn test_second_bulk_apply_reports_drift() {
    let result = payload();
    let once = apply_all(DOCUMENT, &result.findings).unwrap();

    // Re-applying the same stale result is total drift
    match apply_all(&once.text, &result.findings) {
        Err(EditError::Drift { skipped }) => assert_eq!(skipped.len(), 3),
        other => panic!("expected drift, got {other:?}"),
    }
}
