#![allow(dead_code)]

use std::path::Path;

use medwise::config::MedwiseConfig;
use tempfile::TempDir;

pub const VOCABULARY: &str = "\
symptom,index
itching,0
skin_rash,1
continuous_sneezing,2
shivering,3
";

pub const LABELS: &str = "\
code,disease
0,Fungal infection
1,Allergy
2,Drug Reaction
";

pub const DESCRIPTION: &str = "\
Disease,Description
Fungal infection,Fungal infection is a common skin condition caused by fungi.
Allergy,Allergy is an immune system reaction to a foreign substance.
";

pub const PRECAUTIONS: &str = "\
Unnamed: 0,Disease,Precaution_1,Precaution_2,Precaution_3,Precaution_4
0,Fungal infection,bath twice,use detol or neem in bathing water,keep infected area dry,use clean cloths
1,Allergy,apply calamine,cover area with bandage,,use ice to compress itching
2,Allergy,avoid pollen,wear a mask,keep windows closed,
";

pub const MEDICATIONS: &str = "\
Disease,Medication
Fungal infection,\"['Antifungal Cream', 'Fluconazole', 'Terbinafine']\"
Allergy,\"['Antihistamines', 'Decongestants']\"
";

pub const DIETS: &str = "\
Disease,Diet
Fungal infection,\"['Antifungal Diet', 'Probiotics', 'Garlic']\"
";

pub const WORKOUT: &str = "\
Unnamed: 0,disease,workout
0,Fungal infection,Avoid sugary foods
1,Fungal infection,Consume probiotics
2,Allergy,Stay hydrated
";

/// Four classes over the four fixture symptoms. `itching` wins class 0,
/// `continuous_sneezing` wins class 1, an all-zero vector falls to class 2
/// through its intercept, and `shivering` alone wins class 7, which has no
/// label.
pub const LINEAR_MODEL: &str = r#"{
    "classes": [0, 1, 2, 7],
    "coef": [
        [2.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 2.0, 1.0],
        [0.0, 0.0, 0.0, 0.0],
        [-1.0, -1.0, -1.0, 3.0]
    ],
    "intercept": [0.0, 0.0, 0.1, 0.0]
}"#;

pub const MEDICINES: &str = "\
medicine_name,composition
Paracetamol,Paracetamol 500mg
Cetirizine,Cetirizine 10mg
Paracetamol,Paracetamol 650mg
";

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

/// A data directory with every fixture file plus a linear model, and a config
/// pointing at it. Keep the `TempDir` alive for the duration of the test.
pub fn fixture_config() -> (MedwiseConfig, TempDir) {
    let tmp = TempDir::new().unwrap();
    let data = tmp.path().join("data");
    std::fs::create_dir_all(&data).unwrap();

    write(&data, "symptom_vocabulary.csv", VOCABULARY);
    write(&data, "disease_labels.csv", LABELS);
    write(&data, "description.csv", DESCRIPTION);
    write(&data, "precautions_df.csv", PRECAUTIONS);
    write(&data, "medications.csv", MEDICATIONS);
    write(&data, "diets.csv", DIETS);
    write(&data, "workout_df.csv", WORKOUT);
    write(&data, "medicine.csv", MEDICINES);
    write(tmp.path(), "model.json", LINEAR_MODEL);

    let mut config = MedwiseConfig::default();
    config.data.dir = data.to_string_lossy().into_owned();
    config.model.format = "linear".into();
    config.model.path = tmp.path().join("model.json").to_string_lossy().into_owned();
    config.storage.db_path = tmp.path().join("medwise.db").to_string_lossy().into_owned();
    config.matcher.cache_dir = tmp.path().join("models").to_string_lossy().into_owned();
    (config, tmp)
}
