//! Provider recognition tables.
//!
//! The OEM ships its providers under a different display name per locale, so
//! recognition is by membership in these sets. Each set must stay exhaustive
//! across shipped locales: a missing translation means the quirk silently does
//! not apply on that locale. Duplicates are removed; order is irrelevant.

/// Localized names of the OEM watch home app, which hosts the calendar provider.
pub const WATCH_HOME_APP_NAMES: &[&str] = &[
    "One UI Watch Home",
    "شاشة One UI الرئيسية للساعة",
    "One UI ঘড়ীৰ হোম",
    "One UI Saat Əsas ekranı",
    "Галоўны экран One UI для гадз.",
    "Начало на часовник с One UI",
    "One UI ঘড়ির হোম",
    "Početni ekran za One UI Watch",
    "Inici de rellotge One UI",
    "One UI pro chytré hodinky",
    "Startside for One UI til ur",
    "One UI-Uhr-Startbildschirm",
    "Αρχική ρολογιού One UI",
    "Inicio de One UI Watch",
    "One UI kella avaekraan",
    "One UI erlojuen pant. nagusia",
    "صفحه اصلی ساعت مچی One UI",
    "One UI -kellon etusivu",
    "Écran d'accueil de montre One UI",
    "Baile Uaireadóra One UI",
    "Inicio de reloxo One UI",
    "One UI ઘડિયાળનું હોમ",
    "One UI घड़ी होम",
    "Početni zaslon za One UI Watch",
    "One UI kezdőképernyő az órán",
    "One UI Ժամացույցի Հիմն. էկրան",
    "Beranda One UI Watch",
    "Heimaskjár One UI-úrs",
    "Home di One UI Watch",
    "בית One UI לשעון",
    "One UI時計ホーム",
    "One UI საათის საწყისი გვერდი",
    "One UI сағат-ң Бастапқы пернесі",
    "គេហ One UI Watch",
    "One UI Watch ಹೋಮ್",
    "One UI Watch 홈",
    "One UI Үй Көзөмөлү",
    "„One UI“ laikrodžio pradžia",
    "One UI pulksteņa sākuma ekrāns",
    "One UI വാച്ച് ഹോം",
    "One UI Цагийн Гэр",
    "One UI घड्याळ होम",
    "One UI-klokkestart",
    "One UI वाच होम",
    "Startpagina One UI horloge",
    "One UI ଘଣ୍ଟା ହୋମ୍",
    "One UI Watch ਹੋਮ",
    "Ekran główny One UI do zegarka",
    "Tela inicial do One UI Watch",
    "Tasta Acasă a ceasului One UI",
    "One UI ඔරලෝසු නිවහන",
    "Domovská obr. One UI pre hodinky",
    "Domača stran One UI za uro",
    "Baza One UI për orën",
    "One UI početni ekran sata",
    "Hemskärm för One UI-klocka",
    "One UI வாட்ச் முகப்பு",
    "One UI గడియారం హోమ్",
    "Экрани асосии One UI барои соат",
    "หน้าหลัก One UI Watch",
    "One UI sagat öýi",
    "One UI Watch Ana ekranı",
    "One UI واچ ہوم",
    "One UI Soat asosiy tugmasi",
    "Trang chủ One UI Watch",
    "One UI 手表主屏幕",
    "One UI 手錶首頁",
];

/// Localized names of the OEM health suite.
pub const HEALTH_APP_NAMES: &[&str] = &[
    "Samsung Health",
    "三星健康",
];

pub const HEART_RATE_PROVIDER_NAMES: &[&str] = &[
    "Heartrate",
    "سرعة ضربات القلب",
    "হৃদ হাৰ",
    "Ürək ritmi",
    "Част. пул.",
    "Сър. ритъм",
    "হৃদস্পন্দনের হার",
    "হৃদয. হার",
    "སྙིང་འཕར་ཚད།",
    "Puls",
    "Ritme card",
    "Srd. tep",
    "Καρ. παλμ.",
    "Heart rate",
    "FC",
    "RC",
    "Süd. löög.",
    "Bihotz frek.",
    "ضربان قلب",
    "Syke",
    "Cardio",
    "Fréq. car.",
    "Croíráta",
    "Ritmo car.",
    "હૃદય દર",
    "हृदय गति",
    "Otk. srca",
    "Pulzus",
    "Սրտխփ. հճխ",
    "Dnyt jntng",
    "Púls",
    "Freq. card.",
    "דופק לב",
    "心拍数",
    "პულსი",
    "Жүрек соғ.",
    "អត្រាបេះដូង",
    "ಹೃದಯ ಬಡಿತದ ದರ",
    "심박수",
    "Жүрөк согушу",
    "ອັດຕາຫົວໃຈເຕັ້ນ",
    "Šird. rit.",
    "Sirds rit.",
    "Пулс",
    "ഹൃദയമിടി.",
    "Зүрхний цохилт",
    "हृदय गती",
    "Kdr jntung",
    "နှလုံး ခုန်နှုန်း",
    "ႏွလုံး ခုန္ႏႈန္း",
    "Hartslag",
    "ହାର୍ଟ୍ ରେଟ୍",
    "ਦਿਲ ਦੀ ਗਤੀ",
    "Tyntno",
    "Freq. car.",
    "Пульс",
    "හෘද වේගය",
    "Srdcový tep",
    "Srč. utrip",
    "Rr. zemrës",
    "இ.து.விகி.",
    "హృదయ స్పందన రేటు",
    "Тапиши дил",
    "อัตราการเต้นหัวใจ",
    "Ýürek ritm",
    "Klp atş hz",
    "心率",
    "شرح قلب",
    "Yurak puls",
    "Nhịp tim",
    "心跳率",
];

pub const CALENDAR_PROVIDER_NAMES: &[&str] = &[
    "التقويم",
    "কেলেণ্ডাৰ",
    "Təqvim",
    "Каляндар",
    "Календар",
    "ক্যালেন্ডার",
    "Kalendar",
    "Calendari",
    "Kalendář",
    "Kalender",
    "Ημερολόγιο",
    "Calendar",
    "Calendario",
    "Egutegia",
    "تقویم",
    "Kalenteri",
    "Calendrier",
    "Féilire",
    "કૅલેન્ડર",
    "कैलेंडर",
    "Naptár",
    "Օրացույց",
    "Dagatal",
    "לוח שנה",
    "カレンダー",
    "კალენდარი",
    "Күнтізбе",
    "ប្រតិទិន",
    "ಕ್ಯಾಲೆಂಡರ್",
    "캘린더",
    "Календарь",
    "ປະຕິທິນ",
    "Kalendorius",
    "Kalendārs",
    "കലണ്ടര്‍",
    "Хуанли",
    "दिनदर्शिका",
    "ပြက္ခဒိန်",
    "ျပကၡဒိန္",
    "पात्रो",
    "Agenda",
    "କ୍ୟାଲେଣ୍ଡର୍",
    "ਕੈਲੇਂਡਰ",
    "Kalendarz",
    "Kalyndŏrz",
    "Calendário",
    "දිනදර්ශනය",
    "Kalendár",
    "Koledar",
    "Kalendari",
    "நாட்காட்டி",
    "క్యాలెండర్",
    "Тақвим",
    "ปฏิทิน",
    "Senenama",
    "Kalendaryo",
    "Takvim",
    "کیلنڈر",
    "Lịch",
    "日历",
    "日曆",
];

pub const DAILY_ACTIVITY_PROVIDER_NAMES: &[&str] = &[
    "Daily Activity",
    "النشاط اليومي",
    "দৈনিক কাৰ্যকলাপ",
    "Gündəlik fəaliyyət",
    "Дзённая актыўнасць",
    "Дневна активност",
    "দৈনিক অ্যাক্টিভিটি",
    "দৈনিক ক্রিয়াকলাপ",
    "ཉིན་རེའི་འགུལ་སྐྱོད་ཚད།",
    "Dnevna aktivnost",
    "Activitat diària",
    "Denní aktivita",
    "Daglig aktivitet",
    "Tägliche Aktivität",
    "Ημερήσια δραστηριότητα",
    "Daily activity",
    "Actividad diaria",
    "Igapäevane tegevus",
    "Eguneroko jarduera",
    "فعالیت روزانه",
    "Päivittäinen aktiviteetti",
    "Activité quotidienne",
    "Gníomhaíocht laethúil",
    "Actividade diaria",
    "દૈનિક પ્રવૃત્તિ",
    "प्रतिदिन की गतिविधि",
    "Napi tevékenység",
    "Օրական գործունեություն",
    "Aktivitas harian",
    "Dagleg hreyfing",
    "Attività giornaliera",
    "פעילות יומית",
    "1日の活動",
    "ყოველდღიური აქტივობა",
    "Күнделікті әрекет",
    "សកម្មភាព​ប្រចាំថ្ងៃ",
    "ದೈನಂದಿನ ಚಟುವಟಿಕೆ",
    "일일 활동",
    "Күнүмдүк иш-аракет",
    "ກິດຈະກຳປະຈຳວັນ",
    "Kasdienė veikla",
    "Dienas aktivitātes",
    "ദൈനംദിന പ്രവർത്തനം",
    "Өдөр бүрийн үйл хөдлөл",
    "दररोजची क्रिया",
    "Aktiviti harian",
    "နေ့စဉ် လှုပ်ရှားမှု",
    "ေန႔စဥ္ လႈပ္ရွားမႈ",
    "दैनिक क्रियाकलाप",
    "Dagelijkse activiteit",
    "ଦୈନିକ କାର୍ଯ୍ୟକଳାପ",
    "ਰੋਜ਼ਾਨਾ ਗਤੀਵਿਧੀ",
    "Dzienna aktywność",
    "Dziynno aktywnoś",
    "Atividade diária",
    "Actividade diária",
    "Activitate zilnică",
    "Активность",
    "දිනපතා ක්‍රියාකාරකම",
    "Denná aktivita",
    "Dnevna dejavnost",
    "Aktiviteti ditor",
    "தினசரி செயல்பாடு",
    "రోజువారీ కార్యాచరణ",
    "Фаъолияти ҳаррӯза",
    "กิจกรรมประจำวัน",
    "Günlük işjeňligi",
    "Pang-araw-araw na aktibidad",
    "Günlük etkinlik",
    "كۈندىلىك ھەرىكەت",
    "Фізичні навантаження за день",
    "روزانہ کی سرگرمی",
    "Kundalik faoliyat",
    "Hoạt động hàng ngày",
    "每日活动量",
    "每日運動量",
    "每日活動",
];

pub const STEPS_PROVIDER_NAMES: &[&str] = &[
    "Steps",
    "الخطوات",
    "খোজ",
    "Addımlar",
    "Крокі",
    "Крачки",
    "পদক্ষেপ",
    "পদক্ষেপগুলি",
    "གོམ་གྲངས་འཇལ",
    "Koraci",
    "Passes",
    "Kroky",
    "Skridt",
    "Schritte",
    "Βήματα",
    "Pasos",
    "Sammud",
    "Pausoak",
    "قدمها",
    "Askeleet",
    "Pas",
    "Céim",
    "પગલાં",
    "कदम",
    "Lépések",
    "Քայլեր",
    "Langkah",
    "Skref",
    "Passi",
    "צעדים",
    "歩",
    "ნაბიჯები",
    "Қадамдар",
    "ជំហាន",
    "ಹೆಜ್ಜೆಗಳು",
    "걸음 수",
    "Кадамдар",
    "ກ້າວ",
    "Žingsniai",
    "Soļi",
    "Чекори",
    "ചുവടുകൾ",
    "Алхам",
    "पाऊले",
    "ခြေလှမ်းများ",
    "ေျခလွမ္းမ်ား",
    "Skritt",
    "चरणहरू",
    "Stappen",
    "ପାଦଗୁଡିକ",
    "ਕਦਮ",
    "Kroki",
    "Krokōw",
    "Passos",
    "Pași",
    "Шаги",
    "පියවර",
    "Koraki",
    "Hapat",
    "Steg",
    "காலடிகள்",
    "అడుగులు",
    "Қадамҳо",
    "ก้าว",
    "Ädimler",
    "Hakbang",
    "Adım",
    "计步",
    "Кроки",
    "مراحل",
    "Qadaml",
    "Các bước",
    "步數",
];

pub const SLEEP_PROVIDER_NAMES: &[&str] = &[
    "Sleep",
    "النوم",
    "নিদ্ৰা",
    "Yuxu",
    "Сон",
    "Сън",
    "ঘুম",
    "নিদ্রা",
    "གཉིད་མལ།",
    "Spavanje",
    "Repòs",
    "Spánek",
    "Søvn",
    "Schlaf",
    "Ύπνος",
    "Sueño",
    "Magamine",
    "Lo",
    "خواب",
    "Uni",
    "Sommeil",
    "Codladh",
    "Sono",
    "નિદ્રા",
    "निद्रा",
    "Alvás",
    "Քուն",
    "Tidur",
    "Svefn",
    "Sonno",
    "שינה",
    "睡眠",
    "ძილი",
    "Ұйқы",
    "គេង",
    "ನಿದ್ರೆ",
    "수면",
    "Уйку",
    "ນອນຫຼັບ",
    "Miegas",
    "Miegs",
    "Спиење",
    "ഉറക്കം",
    "Унтлага",
    "झोप",
    "အိပ်စက်ခြင်း",
    "အိပ္စက္ျခင္း",
    "शयन",
    "Slaap",
    "ଶୟନ",
    "ਨੀਂਦ",
    "Sen",
    "Spanie",
    "Dormir",
    "Somn",
    "නින්ද",
    "Spánok",
    "Spanje",
    "Gjumë",
    "Sömn",
    "உறக்கம்",
    "నిద్ర స్థితి",
    "Хоб",
    "การนอนหลับ",
    "Uky",
    "Pagtulog",
    "Uyku",
    "سلیپ",
    "Uyqu",
    "Ngủ",
];

pub const WATER_PROVIDER_NAMES: &[&str] = &[
    "Water",
    "ماء",
    "পানী",
    "Su",
    "Вада",
    "Вода",
    "পানি",
    "জল",
    "ཆུ།",
    "Voda",
    "Aigua",
    "Vand",
    "Wasser",
    "Νερό",
    "Agua",
    "Vesi",
    "Ura",
    "آب",
    "Eau",
    "Uisce",
    "Auga",
    "પાણી",
    "पानी",
    "Víz",
    "Ջուր",
    "Air",
    "Vatn",
    "Acqua",
    "מים",
    "水分",
    "წყალი",
    "Су",
    "ទឹក",
    "ನೀರು",
    "물",
    "Суу",
    "ນໍ້າ",
    "Vanduo",
    "Ūdens",
    "വാട്ടര്‍",
    "Ус",
    "पाणी",
    "ရေ",
    "ေရ",
    "Vann",
    "जल",
    "ଜଳ",
    "ਪਾਣੀ",
    "Woda",
    "Água",
    "Apă",
    "ජලය",
    "Ujë",
    "Vatten",
    "நீர்",
    "నీరు",
    "Об",
    "น้ำ",
    "Suw",
    "Tubig",
    "سۇ",
    "پانی",
    "Suv",
    "Nước",
    "水",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_populated_and_unique() {
        for table in [
            WATCH_HOME_APP_NAMES,
            HEALTH_APP_NAMES,
            HEART_RATE_PROVIDER_NAMES,
            CALENDAR_PROVIDER_NAMES,
            DAILY_ACTIVITY_PROVIDER_NAMES,
            STEPS_PROVIDER_NAMES,
            SLEEP_PROVIDER_NAMES,
            WATER_PROVIDER_NAMES,
        ] {
            assert!(!table.is_empty());
            let unique: std::collections::HashSet<_> = table.iter().collect();
            assert_eq!(unique.len(), table.len());
        }
    }

    #[test]
    fn english_names_present() {
        assert!(HEALTH_APP_NAMES.contains(&"Samsung Health"));
        assert!(WATCH_HOME_APP_NAMES.contains(&"One UI Watch Home"));
        assert!(STEPS_PROVIDER_NAMES.contains(&"Steps"));
    }
}
