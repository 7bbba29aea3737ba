use lazy_static::lazy_static;
use std::collections::HashSet;
use std::path::Path;

lazy_static! {
    static ref INDONESIAN: HashSet<&'static str> = {
        let words: &[&str] = &[
            "ada","adalah","agak","agar","akan","amat","anda","antara","anu","apakah","apalagi","atau",
            "bagaimanapun","bagi","bahwa","begitu","belum","bisa","boleh",
            "dahulu","dalam","dan","dapat","dari","daripada","demi","demikian","dengan","di","dia","dimana","dll","dsb","dst","dulunya",
            "guna","hal","hanya","harus","ia","ingin","ini","itu","itulah",
            "jika","juga","kah","kami","karena","ke","kecuali","kembali","kemana","kenapa","kepada","ketika","kita",
            "lagi","lain","maka","mari","masih","melainkan","mengapa","menurut","mereka",
            "namun","nanti","nggak","oh","oleh","ok","pada","para","pasti","pula","pun",
            "saat","saja","sambil","sampai","saya","sebab","sebagai","sebelum","sebetulnya","secara","sedangkan",
            "seharusnya","sehingga","selagi","selain","sementara","seolah","seperti","seraya","serta","sesuatu",
            "sesudah","setelah","seterusnya","setiap","setidaknya","sudah","supaya",
            "tanpa","tapi","telah","tentang","tentu","terhadap","tetapi","toh","tolong",
            "untuk","walau","ya","yaitu","yakni","yang",
        ];
        words.iter().copied().collect()
    };
    static ref ENGLISH: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could","did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

/// Union of the built-in Indonesian and English lists plus caller-supplied words.
/// Every token is checked against all of them; there is no language detection.
#[derive(Debug, Clone, Default)]
pub struct StopwordSet {
    extra: HashSet<String>,
}

impl StopwordSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for w in words {
            let w = w.as_ref().trim().to_lowercase();
            if !w.is_empty() {
                self.extra.insert(w);
            }
        }
        self
    }

    /// Reads one stopword per line; blank lines and `#` comments are skipped.
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let words: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();
        tracing::debug!(path = %path.as_ref().display(), count = words.len(), "loaded extra stopwords");
        Ok(self.with_words(words))
    }

    pub fn contains(&self, token: &str) -> bool {
        INDONESIAN.contains(token) || ENGLISH.contains(token) || self.extra.contains(token)
    }

    /// Caller-supplied words, sorted, so they can be persisted alongside an index.
    pub fn extra_words(&self) -> Vec<String> {
        let mut words: Vec<String> = self.extra.iter().cloned().collect();
        words.sort();
        words
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_languages_apply() {
        let set = StopwordSet::new();
        assert!(set.contains("dan"));
        assert!(set.contains("the"));
        assert!(!set.contains("energi"));
    }

    #[test]
    fn extra_words_are_normalized() {
        let set = StopwordSet::new().with_words(["  Bumi ", ""]);
        assert!(set.contains("bumi"));
        assert_eq!(set.extra_words(), vec!["bumi".to_string()]);
    }

    #[test]
    fn reads_word_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stopwords.txt");
        std::fs::write(&path, "# domain noise\nlaporan\n\nhalaman\n").unwrap();
        let set = StopwordSet::new().with_file(&path).unwrap();
        assert!(set.contains("laporan"));
        assert!(set.contains("halaman"));
        assert!(!set.contains("# domain noise"));
    }
}
